use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::Context;

use crate::chunk_reader::read_line;
use crate::config::Config;
use crate::line_record::LineRecord;
use crate::notifier::{percent, Notifier, ProgressThrottle, PHASE_CACHING_TO_DISK};
use crate::sorted_chunk_file::SortedChunkFile;
use crate::temp_file::TempFileManager;

const PROGRESS_LINES: u64 = 5_000;
const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Outcome of splitting an input into sorted chunks
#[derive(Debug)]
pub(crate) struct SplitResult {
    chunks: Vec<SortedChunkFile>,
    header: Option<String>,
    data_lines: u64,
}

impl SplitResult {
    /// Chunks in creation order
    pub(crate) fn chunks(&self) -> &Vec<SortedChunkFile> {
        &self.chunks
    }

    pub(crate) fn header(&self) -> &Option<String> {
        &self.header
    }

    /// Data lines that survived filtering, the sum of the chunk line counts
    pub(crate) fn data_lines(&self) -> u64 {
        self.data_lines
    }
}

/// Streams an input and persists it as chunk files, each sorted in memory and bounded by the
/// chunk size.
pub(crate) struct ChunkSplitter<'a> {
    config: &'a Config,
    notifier: &'a dyn Notifier,
}

impl<'a> ChunkSplitter<'a> {
    pub(crate) fn new(config: &'a Config, notifier: &'a dyn Notifier) -> ChunkSplitter<'a> {
        ChunkSplitter {
            config,
            notifier,
        }
    }

    /// Split `reader` into sorted chunk files created through `temp_files`. `input_len` is the
    /// input size in bytes and only drives progress reporting.
    pub(crate) fn split<R: BufRead>(
        &self,
        reader: &mut R,
        input_len: u64,
        temp_files: &mut TempFileManager,
    ) -> Result<SplitResult, anyhow::Error> {
        let header = if self.config.has_header_line() {
            read_line(reader).with_context(|| "reading header line")?
        } else {
            None
        };

        let chunk_size = self.config.chunk_size_bytes();
        let mut chunks = Vec::new();
        let mut batch: Vec<LineRecord> = Vec::new();
        let mut batch_bytes: u64 = 0;
        let mut bytes_read: u64 = header.as_ref().map(|h| h.len() as u64 + 1).unwrap_or(0);
        let mut lines_read: u64 = 0;
        let mut data_lines: u64 = 0;
        let mut throttle = ProgressThrottle::new(PROGRESS_LINES, PROGRESS_INTERVAL);

        while let Some(line) = read_line(reader).with_context(|| format!("reading input line {}", lines_read + 1))? {
            lines_read += 1;
            let size = line.len() as u64 + 1;
            bytes_read += size;
            if throttle.due(lines_read) {
                self.notifier.progress(PHASE_CACHING_TO_DISK, percent(bytes_read, input_len));
            }

            if self.config.is_filtered(&line) {
                continue;
            }

            data_lines += 1;
            batch_bytes += size;
            batch.push(LineRecord::new(line, self.config.field(), self.config.order()));
            if batch_bytes >= chunk_size {
                let chunk = self.write_chunk(&mut batch, chunks.len() + 1, temp_files, percent(bytes_read, input_len))?;
                chunks.push(chunk);
                batch_bytes = 0;
            }
        }

        if !batch.is_empty() {
            let chunk = self.write_chunk(&mut batch, chunks.len() + 1, temp_files, percent(bytes_read, input_len))?;
            chunks.push(chunk);
        }

        log::info!("Split {} data lines into {} sorted chunks", data_lines, chunks.len());
        Ok(
            SplitResult {
                chunks,
                header,
                data_lines,
            }
        )
    }

    fn write_chunk(
        &self,
        batch: &mut Vec<LineRecord>,
        chunk_number: usize,
        temp_files: &mut TempFileManager,
        percent_complete: f32,
    ) -> Result<SortedChunkFile, anyhow::Error> {
        self.notifier.status(format!("   sorting chunk {}: {} rows", chunk_number, batch.len()).as_str());
        self.notifier.progress(format!("sorting chunk {}", chunk_number).as_str(), percent_complete);
        batch.sort();

        let (mut writer, path) = temp_files.create_chunk_file(chunk_number)?;
        let mut lines: u64 = 0;
        let mut bytes: u64 = 0;
        for line_record in batch.drain(..) {
            let line = line_record.line();
            writer.write_all(line.as_bytes())
                .and_then(|_| writer.write_all(b"\n"))
                .with_context(|| format!("path: {}", path.display()))?;
            lines += 1;
            bytes += line.len() as u64 + 1;
        }
        writer.flush().with_context(|| format!("path: {}", path.display()))?;
        Ok(SortedChunkFile::new(path, lines, bytes))
    }
}
