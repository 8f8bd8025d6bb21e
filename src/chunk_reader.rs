use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Read the next line without its line terminator ("\n" or "\r\n"). Returns None at the end of
/// the stream.
pub(crate) fn read_line<R: BufRead>(reader: &mut R) -> Result<Option<String>, anyhow::Error> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Some(line))
}

/// Sequential reader over one sorted chunk file, a member of the merge frontier.
#[derive(Debug)]
pub(crate) struct ChunkReader {
    path: PathBuf,
    reader: BufReader<File>,
    lines: u64,
}

impl ChunkReader {
    pub(crate) fn open(path: &Path) -> Result<ChunkReader, anyhow::Error> {
        let file = File::open(path).with_context(|| format!("path: {}", path.display()))?;
        Ok(
            ChunkReader {
                path: path.to_path_buf(),
                reader: BufReader::new(file),
                lines: 0,
            }
        )
    }

    pub(crate) fn next_line(&mut self) -> Result<Option<String>, anyhow::Error> {
        let line = read_line(&mut self.reader)
            .with_context(|| format!("path: {}, line: {}", self.path.display(), self.lines + 1))?;
        if line.is_some() {
            self.lines += 1;
        }
        Ok(line)
    }

    pub(crate) fn path(&self) -> &PathBuf {
        &self.path
    }
}
