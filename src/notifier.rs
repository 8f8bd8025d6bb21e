//! Status, warning, error and progress notifications emitted while sorting.
//!
//! A [Sort](crate::sort::Sort) reports through a [Notifier]. The default [LogNotifier] forwards
//! everything to the `log` facade; applications that drive a UI or a console can provide their own
//! implementation with [Sort::with_notifier](crate::sort::Sort::with_notifier).

use std::time::{Duration, Instant};

/// Progress phase while reading the input into memory
pub const PHASE_CACHING_IN_MEMORY: &str = "caching data in memory";
/// Progress phase while splitting the input into sorted chunk files
pub const PHASE_CACHING_TO_DISK: &str = "caching data to disk";
/// Progress phase while writing the sorted output
pub const PHASE_WRITING: &str = "writing to disk";

/// Receiver of sort notifications.
pub trait Notifier {
    /// Informational message.
    fn status(&self, message: &str);

    /// Non fatal problem, the sort continues.
    fn warning(&self, message: &str);

    /// The sort failed.
    fn error(&self, message: &str, cause: Option<&anyhow::Error>);

    /// Progress of `phase` in percent, 0 to 100.
    fn progress(&self, phase: &str, percent_complete: f32);
}

/// [Notifier] writing to the `log` facade
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn status(&self, message: &str) {
        log::info!("{}", message);
    }

    fn warning(&self, message: &str) {
        log::warn!("{}", message);
    }

    fn error(&self, message: &str, cause: Option<&anyhow::Error>) {
        match cause {
            None => {
                log::error!("{}", message);
            }
            Some(e) => {
                log::error!("{}: {:#}", message, e);
            }
        }
    }

    fn progress(&self, phase: &str, percent_complete: f32) {
        log::debug!("{}: {:.1}%", phase, percent_complete);
    }
}

pub(crate) fn percent(done: u64, total: u64) -> f32 {
    if total == 0 {
        100.0
    } else {
        (done as f64 / total as f64 * 100.0).min(100.0) as f32
    }
}

/// Throttles progress notifications: the clock is only polled every `every_lines` lines and a
/// notification is due when at least `interval` passed since the previous one.
pub(crate) struct ProgressThrottle {
    every_lines: u64,
    interval: Duration,
    last: Instant,
}

impl ProgressThrottle {
    pub(crate) fn new(every_lines: u64, interval: Duration) -> ProgressThrottle {
        ProgressThrottle {
            every_lines: every_lines.max(1),
            interval,
            last: Instant::now(),
        }
    }

    pub(crate) fn due(&mut self, lines: u64) -> bool {
        if lines % self.every_lines != 0 {
            return false;
        }
        let now = Instant::now();
        if now.duration_since(self.last) >= self.interval {
            self.last = now;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use std::cell::RefCell;

    use crate::notifier::Notifier;

    /// Collects notifications for assertions
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub(crate) statuses: RefCell<Vec<String>>,
        pub(crate) warnings: RefCell<Vec<String>>,
        pub(crate) errors: RefCell<Vec<String>>,
        pub(crate) phases: RefCell<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn status(&self, message: &str) {
            self.statuses.borrow_mut().push(message.to_string());
        }

        fn warning(&self, message: &str) {
            self.warnings.borrow_mut().push(message.to_string());
        }

        fn error(&self, message: &str, _cause: Option<&anyhow::Error>) {
            self.errors.borrow_mut().push(message.to_string());
        }

        fn progress(&self, phase: &str, _percent_complete: f32) {
            self.phases.borrow_mut().push(phase.to_string());
        }
    }
}
