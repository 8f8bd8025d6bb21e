use std::io::Write;
use std::time::Duration;

use anyhow::Context;

use crate::notifier::{percent, Notifier, ProgressThrottle, PHASE_WRITING};

const PROGRESS_LINES: u64 = 50_000;
const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Writes the header and the sorted data lines to the output, counting lines and reporting
/// "writing to disk" progress against the expected total.
pub(crate) struct SortedOutput<'a, W: Write> {
    writer: &'a mut W,
    notifier: &'a dyn Notifier,
    expected_lines: u64,
    lines_written: u64,
    throttle: ProgressThrottle,
}

impl<'a, W: Write> SortedOutput<'a, W> {
    pub(crate) fn new(writer: &'a mut W, notifier: &'a dyn Notifier, expected_lines: u64) -> SortedOutput<'a, W> {
        SortedOutput {
            writer,
            notifier,
            expected_lines,
            lines_written: 0,
            throttle: ProgressThrottle::new(PROGRESS_LINES, PROGRESS_INTERVAL),
        }
    }

    /// Write the header verbatim. It is not counted as a data line.
    pub(crate) fn write_header(&mut self, header: &Option<String>) -> Result<(), anyhow::Error> {
        if let Some(header) = header {
            self.write(header).with_context(|| "writing header line")?;
        }
        Ok(())
    }

    pub(crate) fn write_line(&mut self, line: &str) -> Result<(), anyhow::Error> {
        self.write(line).with_context(|| format!("writing output line {}", self.lines_written + 1))?;
        self.lines_written += 1;
        if self.throttle.due(self.lines_written) {
            self.notifier.progress(PHASE_WRITING, percent(self.lines_written, self.expected_lines));
        }
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<u64, anyhow::Error> {
        self.writer.flush().with_context(|| "flushing output")?;
        self.notifier.progress(PHASE_WRITING, 100.0);
        Ok(self.lines_written)
    }

    fn write(&mut self, line: &str) -> std::io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")
    }
}
