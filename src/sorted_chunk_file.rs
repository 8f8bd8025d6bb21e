use std::path::PathBuf;

/// A sorted chunk persisted by the splitter. Identity is the path; line and byte counts are
/// recorded when the chunk is written.
#[derive(Clone, Debug)]
pub(crate) struct SortedChunkFile {
    path: PathBuf,
    lines: u64,
    bytes: u64,
}

impl SortedChunkFile {
    pub(crate) fn new(path: PathBuf, lines: u64, bytes: u64) -> SortedChunkFile {
        SortedChunkFile {
            path,
            lines,
            bytes,
        }
    }

    pub(crate) fn path(&self) -> &PathBuf {
        &self.path
    }

    pub(crate) fn lines(&self) -> u64 {
        self.lines
    }

    pub(crate) fn bytes(&self) -> u64 {
        self.bytes
    }
}
