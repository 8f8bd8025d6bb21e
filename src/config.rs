use std::path::PathBuf;

use regex::Regex;

use crate::field::Field;
use crate::field_type::FieldType;
use crate::memory::{MemoryBudgetAdvisor, MB};
use crate::notifier::Notifier;
use crate::order::Order;
use crate::sort_request::SortRequest;

/// A [SortRequest] resolved against the memory budget. Built once per sort and read only.
#[derive(Clone, Debug)]
pub(crate) struct Config {
    tmp: PathBuf,
    tmp_prefix: String,
    tmp_suffix: String,
    has_header_line: bool,
    keep_empty_lines: bool,
    ignore_lines: Option<Regex>,
    keep_temp_files: bool,
    in_memory_threshold_bytes: u64,
    chunk_size_bytes: u64,
    field: Field,
    order: Order,
}

impl Config {
    pub(crate) fn new(request: &SortRequest, advisor: &MemoryBudgetAdvisor, notifier: &dyn Notifier) -> Config {
        let in_memory_threshold_bytes = match request.max_in_memory_sort_size_bytes() {
            None => {
                advisor.clamp_in_memory_threshold_mb(request.max_in_memory_sort_size_mb()) * MB
            }
            Some(bytes) => {
                advisor.clamp_in_memory_threshold_bytes(bytes)
            }
        };

        let chunk_size_bytes = match request.chunk_size_bytes() {
            None => {
                advisor.clamp_chunk_size_mb(request.chunk_size_mb()) * MB
            }
            Some(bytes) => {
                advisor.clamp_chunk_size_bytes(bytes)
            }
        };

        if request.sort_column() == 0 && request.sort_column_is_numeric() {
            notifier.warning("Numeric sorting requires a sort column; sorting complete lines as text");
        }

        let field_type = if request.sort_column() == 0 {
            FieldType::String
        } else {
            request.field_type()
        };

        let field = Field::new(request.sort_column(), field_type)
            .with_separator(request.column_delimiter())
            .with_ignore_case(request.ignore_case());

        Config {
            tmp: request.working_directory().clone(),
            tmp_prefix: request.tmp_prefix().clone(),
            tmp_suffix: ".tmp".to_string(),
            has_header_line: request.has_header_line(),
            keep_empty_lines: request.keep_empty_lines(),
            ignore_lines: request.ignore_lines().clone(),
            keep_temp_files: request.keep_temp_files(),
            in_memory_threshold_bytes,
            chunk_size_bytes,
            field,
            order: request.order(),
        }
    }

    pub(crate) fn tmp(&self) -> &PathBuf {
        &self.tmp
    }

    pub(crate) fn tmp_prefix(&self) -> &String {
        &self.tmp_prefix
    }

    pub(crate) fn tmp_suffix(&self) -> &String {
        &self.tmp_suffix
    }

    pub(crate) fn has_header_line(&self) -> bool {
        self.has_header_line
    }

    pub(crate) fn keep_temp_files(&self) -> bool {
        self.keep_temp_files
    }

    pub(crate) fn in_memory_threshold_bytes(&self) -> u64 {
        self.in_memory_threshold_bytes
    }

    pub(crate) fn chunk_size_bytes(&self) -> u64 {
        self.chunk_size_bytes
    }

    pub(crate) fn field(&self) -> &Field {
        &self.field
    }

    pub(crate) fn order(&self) -> Order {
        self.order
    }

    /// True for data lines dropped before sorting: blank lines unless kept, and lines matching
    /// the ignore pattern.
    pub(crate) fn is_filtered(&self, line: &str) -> bool {
        if !self.keep_empty_lines && line.trim().is_empty() {
            return true;
        }

        if let Some(r) = &self.ignore_lines {
            if r.is_match(line) {
                return true;
            }
        }
        false
    }

    pub(crate) fn describe(&self) -> String {
        let mut description = format!(
            "SortMode={}",
            match self.order {
                Order::Asc => "Forward",
                Order::Desc => "Reverse",
            }
        );
        if !self.field.whole_line() {
            let delimiter = match self.field.separator() {
                '\t' => "<Tab>".to_string(),
                c => c.to_string(),
            };
            description.push_str(
                format!(
                    ", SortColumn={}, Delimiter={}, Numeric={}",
                    self.field.index(),
                    delimiter,
                    self.field.field_type() == FieldType::Number
                ).as_str()
            );
        }
        if self.field.ignore_case() {
            description.push_str(", IgnoreCase=true");
        }
        description
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use anyhow::anyhow;
    use regex::Regex;

    use crate::config::Config;
    use crate::memory::{MemoryBudgetAdvisor, MemoryProbe, MB};
    use crate::notifier::recording::RecordingNotifier;
    use crate::sort_request::SortRequest;

    pub(crate) struct FixedProbe(pub(crate) u64);

    impl MemoryProbe for FixedProbe {
        fn available_memory_bytes(&self) -> Result<u64, anyhow::Error> {
            if self.0 == 0 {
                Err(anyhow!("no memory information"))
            } else {
                Ok(self.0)
            }
        }
    }

    pub(crate) fn config(request: &SortRequest) -> Config {
        let notifier = RecordingNotifier::default();
        let probe = FixedProbe(4096 * MB);
        let advisor = MemoryBudgetAdvisor::new(&probe, &notifier);
        Config::new(request, &advisor, &notifier)
    }

    #[test]
    fn test_sizes() {
        let config = self::config(&SortRequest::default());
        assert_eq!(config.in_memory_threshold_bytes(), 250 * MB);
        assert_eq!(config.chunk_size_bytes(), 50 * MB);

        let config = self::config(
            &SortRequest::default()
                .with_max_in_memory_sort_size_mb(0)
                .with_chunk_size_mb(100_000)
        );
        assert_eq!(config.in_memory_threshold_bytes(), 10 * MB);
        assert_eq!(config.chunk_size_bytes(), 3891 * MB);

        let config = self::config(
            &SortRequest::default()
                .with_max_in_memory_sort_size_bytes(0)
                .with_chunk_size_bytes(100)
        );
        assert_eq!(config.in_memory_threshold_bytes(), 0);
        assert_eq!(config.chunk_size_bytes(), 100);
    }

    #[test]
    fn test_numeric_without_column_warns() {
        let notifier = RecordingNotifier::default();
        let probe = FixedProbe(4096 * MB);
        let advisor = MemoryBudgetAdvisor::new(&probe, &notifier);
        let config = Config::new(&SortRequest::default().with_sort_column_is_numeric(true), &advisor, &notifier);
        assert!(config.field().whole_line());
        assert_eq!(notifier.warnings.borrow().len(), 1);
    }

    #[test]
    fn test_filter() {
        let config = self::config(&SortRequest::default());
        assert!(config.is_filtered(""));
        assert!(config.is_filtered(" \t "));
        assert!(!config.is_filtered("a"));

        let config = self::config(
            &SortRequest::default()
                .with_keep_empty_lines(true)
                .with_ignore_lines(Regex::new("^#").unwrap())
        );
        assert!(!config.is_filtered(""));
        assert!(config.is_filtered("# comment"));
        assert!(!config.is_filtered("a # not a comment"));
    }

    #[test]
    fn test_describe() {
        let config = self::config(
            &SortRequest::default()
                .with_reverse(true)
                .with_sort_column(2)
                .with_sort_column_is_numeric(true)
        );
        assert_eq!(config.describe(), "SortMode=Reverse, SortColumn=2, Delimiter=<Tab>, Numeric=true");
    }
}
