use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::Context;

use crate::chunk_reader::read_line;
use crate::config::Config;
use crate::line_record::LineRecord;
use crate::notifier::{percent, Notifier, ProgressThrottle, PHASE_CACHING_IN_MEMORY};
use crate::sorted_output::SortedOutput;

const PROGRESS_LINES: u64 = 5_000;
const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Sorts an input that fits the in-memory budget in a single pass.
pub(crate) struct InMemorySorter<'a> {
    config: &'a Config,
    notifier: &'a dyn Notifier,
}

impl<'a> InMemorySorter<'a> {
    pub(crate) fn new(config: &'a Config, notifier: &'a dyn Notifier) -> InMemorySorter<'a> {
        InMemorySorter {
            config,
            notifier,
        }
    }

    /// Read all of `reader`, sort the data lines and write header and lines to `writer`.
    /// Returns the number of data lines written.
    pub(crate) fn sort<R: BufRead, W: Write>(&self, reader: &mut R, input_len: u64, writer: &mut W) -> Result<u64, anyhow::Error> {
        self.internal_sort(reader, input_len, writer)
            .with_context(|| "in-memory sort")
    }

    fn internal_sort<R: BufRead, W: Write>(&self, reader: &mut R, input_len: u64, writer: &mut W) -> Result<u64, anyhow::Error> {
        self.notifier.status("Caching data in memory");
        let header = if self.config.has_header_line() {
            read_line(reader).with_context(|| "reading header line")?
        } else {
            None
        };

        let mut records: Vec<LineRecord> = Vec::new();
        let mut bytes_read: u64 = header.as_ref().map(|h| h.len() as u64 + 1).unwrap_or(0);
        let mut lines_read: u64 = 0;
        let mut throttle = ProgressThrottle::new(PROGRESS_LINES, PROGRESS_INTERVAL);
        while let Some(line) = read_line(reader).with_context(|| format!("reading input line {}", lines_read + 1))? {
            lines_read += 1;
            bytes_read += line.len() as u64 + 1;
            if throttle.due(lines_read) {
                self.notifier.progress(PHASE_CACHING_IN_MEMORY, percent(bytes_read, input_len));
            }
            if !self.config.is_filtered(&line) {
                records.push(LineRecord::new(line, self.config.field(), self.config.order()));
            }
        }
        self.notifier.progress(PHASE_CACHING_IN_MEMORY, 100.0);

        self.notifier.status(format!("Sorting {} lines", records.len()).as_str());
        records.sort();

        self.notifier.status("Writing to disk");
        let mut output = SortedOutput::new(writer, self.notifier, records.len() as u64);
        output.write_header(&header)?;
        for record in records {
            output.write_line(record.as_str())?;
        }
        output.finish()
    }
}
