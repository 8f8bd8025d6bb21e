use std::io::Write;

use anyhow::Context;

use crate::binary_heap::BinaryHeap;
use crate::chunk_reader::ChunkReader;
use crate::config::Config;
use crate::line_record::LineRecord;
use crate::notifier::Notifier;
use crate::sorted_chunk_file::SortedChunkFile;
use crate::sorted_output::SortedOutput;
use crate::temp_file::TempFileManager;

#[derive(Debug)]
struct FrontierEntry {
    record: LineRecord,
    source: usize,
}

/// K-way merge of sorted chunk files for whole line sorts.
///
/// The frontier holds the current line of every chunk that still has data. The smallest line
/// under the configured order is written and replaced by the next line of its chunk.
pub(crate) struct HeapMerger<'a> {
    config: &'a Config,
    notifier: &'a dyn Notifier,
}

impl<'a> HeapMerger<'a> {
    pub(crate) fn new(config: &'a Config, notifier: &'a dyn Notifier) -> HeapMerger<'a> {
        HeapMerger {
            config,
            notifier,
        }
    }

    /// Merge `chunks` into `writer` after writing `header`. Exhausted chunk files are released
    /// through `temp_files`. Returns the number of data lines written.
    pub(crate) fn merge<W: Write>(
        &self,
        chunks: &[SortedChunkFile],
        header: &Option<String>,
        data_lines: u64,
        writer: &mut W,
        temp_files: &mut TempFileManager,
    ) -> Result<u64, anyhow::Error> {
        self.internal_merge(chunks, header, data_lines, writer, temp_files)
            .with_context(|| "merge phase")
    }

    fn internal_merge<W: Write>(
        &self,
        chunks: &[SortedChunkFile],
        header: &Option<String>,
        data_lines: u64,
        writer: &mut W,
        temp_files: &mut TempFileManager,
    ) -> Result<u64, anyhow::Error> {
        let mut output = SortedOutput::new(writer, self.notifier, data_lines);
        output.write_header(header)?;

        let mut readers: Vec<Option<ChunkReader>> = Vec::with_capacity(chunks.len());
        let mut frontier = BinaryHeap::with_capacity(
            chunks.len(),
            |a: &FrontierEntry, b: &FrontierEntry| b.record.cmp(&a.record),
        );

        for (source, chunk) in chunks.iter().enumerate() {
            let mut reader = ChunkReader::open(chunk.path())?;
            match reader.next_line()? {
                Some(line) => {
                    frontier.insert(self.entry(line, source));
                    readers.push(Some(reader));
                }
                None => {
                    drop(reader);
                    temp_files.release(chunk.path());
                    readers.push(None);
                }
            }
        }

        while let Ok(entry) = frontier.pop_root() {
            let FrontierEntry { record, source } = entry;
            output.write_line(record.as_str())?;

            let next = match readers[source].as_mut() {
                Some(reader) => reader.next_line()?,
                None => None,
            };
            match next {
                Some(line) => {
                    frontier.insert(self.entry(line, source));
                }
                None => {
                    if let Some(reader) = readers[source].take() {
                        let path = reader.path().clone();
                        drop(reader);
                        temp_files.release(&path);
                    }
                }
            }
        }

        output.finish()
    }

    fn entry(&self, line: String, source: usize) -> FrontierEntry {
        FrontierEntry {
            record: LineRecord::new(line, self.config.field(), self.config.order()),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use crate::config::tests::config;
    use crate::config::Config;
    use crate::heap_merger::HeapMerger;
    use crate::notifier::recording::RecordingNotifier;
    use crate::sort_request::SortRequest;
    use crate::sorted_chunk_file::SortedChunkFile;
    use crate::temp_file::TempFileManager;

    fn chunk(temp_files: &mut TempFileManager, index: usize, lines: &[&str]) -> Result<SortedChunkFile, anyhow::Error> {
        let (mut writer, path) = temp_files.create_chunk_file(index)?;
        for line in lines {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;
        Ok(SortedChunkFile::new(path, lines.len() as u64, 0))
    }

    fn merge(config: &Config, chunks: &[&[&str]], header: Option<String>) -> Result<(String, Vec<PathBuf>, u64), anyhow::Error> {
        let notifier = RecordingNotifier::default();
        let mut temp_files = TempFileManager::new(config);
        let mut files = Vec::new();
        for (i, lines) in chunks.iter().enumerate() {
            files.push(chunk(&mut temp_files, i + 1, lines)?);
        }
        let total = files.iter().map(|f| f.lines()).sum();
        let mut buffer: Vec<u8> = Vec::new();
        let written = HeapMerger::new(config, &notifier).merge(&files, &header, total, &mut buffer, &mut temp_files)?;
        assert_eq!(written, total);
        let paths = files.iter().map(|f| f.path().clone()).collect();
        Ok((String::from_utf8(buffer)?, paths, written))
    }

    #[test]
    fn test_merge_ascending() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let config = config(&SortRequest::default().with_working_directory(dir.path().to_path_buf()));
        let (output, paths, written) = merge(
            &config,
            &[&["b", "d", "f"], &[], &["a", "c", "e", "g"]],
            Some("header".to_string()),
        )?;
        assert_eq!(output, "header\na\nb\nc\nd\ne\nf\ng\n");
        assert_eq!(written, 7);
        for path in paths {
            assert!(!path.exists());
        }
        Ok(())
    }

    #[test]
    fn test_merge_descending_keeps_files() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let config = config(
            &SortRequest::default()
                .with_working_directory(dir.path().to_path_buf())
                .with_reverse(true)
                .with_keep_temp_files(true)
        );
        let (output, paths, _) = merge(&config, &[&["z", "m", "a"], &["y", "b"]], None)?;
        assert_eq!(output, "z\ny\nm\nb\na\n");
        for path in paths {
            assert!(path.exists());
        }
        Ok(())
    }

    #[test]
    fn test_merge_duplicates_and_blank_lines() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let config = config(
            &SortRequest::default()
                .with_working_directory(dir.path().to_path_buf())
                .with_keep_empty_lines(true)
        );
        let (output, _, written) = merge(&config, &[&["", "a", "a"], &["", "a", "b"]], None)?;
        assert_eq!(output, "\n\na\na\na\nb\n");
        assert_eq!(written, 6);
        Ok(())
    }

    #[test]
    fn test_merge_missing_chunk_fails() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let config = config(&SortRequest::default().with_working_directory(dir.path().to_path_buf()));
        let notifier = RecordingNotifier::default();
        let mut temp_files = TempFileManager::new(&config);
        let files = vec![SortedChunkFile::new(dir.path().join("missing.tmp"), 1, 2)];
        let mut buffer: Vec<u8> = Vec::new();
        let result = HeapMerger::new(&config, &notifier).merge(&files, &None, 1, &mut buffer, &mut temp_files);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("merge phase"));
        Ok(())
    }
}
