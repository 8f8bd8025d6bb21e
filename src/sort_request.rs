use std::path::PathBuf;

use regex::Regex;

use crate::field_type::FieldType;
use crate::order::Order;

/// Default maximum input size, in MB, sorted in memory
pub const DEFAULT_IN_MEMORY_SORT_MAX_FILE_SIZE_MB: u64 = 250;

/// Default chunk size, in MB, for disk backed sorts
pub const DEFAULT_CHUNK_SIZE_MB: u64 = 50;

/// Default prefix of chunk file names
pub const DEFAULT_TMP_PREFIX: &str = "FileSortSwap";

/// Options of one sort operation.
///
/// A default request sorts complete lines in ascending, case sensitive order, treats the first
/// line as a header, drops empty lines and sorts files up to
/// [DEFAULT_IN_MEMORY_SORT_MAX_FILE_SIZE_MB] in memory. Larger files are split into chunks of
/// [DEFAULT_CHUNK_SIZE_MB] stored in `std::env::temp_dir()`.
///
/// Size settings are clamped against available memory when the sort starts.
///
/// # Examples
/// ```
/// use flex_file_sort::sort_request::SortRequest;
///
/// // sort a headerless CSV file by its third column, numerically, largest first
/// let request = SortRequest::default()
///     .with_has_header_line(false)
///     .with_sort_column(3)
///     .with_column_delimiter(',')
///     .with_sort_column_is_numeric(true)
///     .with_reverse(true);
/// assert_eq!(request.sort_column(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct SortRequest {
    order: Order,
    ignore_case: bool,
    has_header_line: bool,
    keep_empty_lines: bool,
    sort_column: usize,
    column_delimiter: char,
    sort_column_is_numeric: bool,
    max_in_memory_sort_size_mb: u64,
    chunk_size_mb: u64,
    max_in_memory_sort_size_bytes: Option<u64>,
    chunk_size_bytes: Option<u64>,
    working_directory: PathBuf,
    keep_temp_files: bool,
    tmp_prefix: String,
    ignore_lines: Option<Regex>,
}

impl Default for SortRequest {
    fn default() -> Self {
        SortRequest {
            order: Order::Asc,
            ignore_case: false,
            has_header_line: true,
            keep_empty_lines: false,
            sort_column: 0,
            column_delimiter: '\t',
            sort_column_is_numeric: false,
            max_in_memory_sort_size_mb: DEFAULT_IN_MEMORY_SORT_MAX_FILE_SIZE_MB,
            chunk_size_mb: DEFAULT_CHUNK_SIZE_MB,
            max_in_memory_sort_size_bytes: None,
            chunk_size_bytes: None,
            working_directory: std::env::temp_dir(),
            keep_temp_files: false,
            tmp_prefix: DEFAULT_TMP_PREFIX.to_string(),
            ignore_lines: None,
        }
    }
}

impl SortRequest {
    pub fn order(&self) -> Order {
        self.order
    }

    pub fn reverse(&self) -> bool {
        self.order == Order::Desc
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn has_header_line(&self) -> bool {
        self.has_header_line
    }

    pub fn keep_empty_lines(&self) -> bool {
        self.keep_empty_lines
    }

    /// 1-based sort column, 0 sorts by the complete line
    pub fn sort_column(&self) -> usize {
        self.sort_column
    }

    pub fn column_delimiter(&self) -> char {
        self.column_delimiter
    }

    pub fn sort_column_is_numeric(&self) -> bool {
        self.sort_column_is_numeric
    }

    /// The [FieldType] of the sort column
    pub fn field_type(&self) -> FieldType {
        if self.sort_column_is_numeric {
            FieldType::Number
        } else {
            FieldType::String
        }
    }

    pub fn max_in_memory_sort_size_mb(&self) -> u64 {
        self.max_in_memory_sort_size_mb
    }

    pub fn chunk_size_mb(&self) -> u64 {
        self.chunk_size_mb
    }

    pub fn max_in_memory_sort_size_bytes(&self) -> Option<u64> {
        self.max_in_memory_sort_size_bytes
    }

    pub fn chunk_size_bytes(&self) -> Option<u64> {
        self.chunk_size_bytes
    }

    pub fn working_directory(&self) -> &PathBuf {
        &self.working_directory
    }

    pub fn keep_temp_files(&self) -> bool {
        self.keep_temp_files
    }

    pub fn tmp_prefix(&self) -> &String {
        &self.tmp_prefix
    }

    pub fn ignore_lines(&self) -> &Option<Regex> {
        &self.ignore_lines
    }

    /// Set [Order]. The default is [Order::Asc]
    pub fn with_order(mut self, order: Order) -> SortRequest {
        self.order = order;
        self
    }

    /// Sort in descending order when true
    pub fn with_reverse(mut self, reverse: bool) -> SortRequest {
        self.order = if reverse { Order::Desc } else { Order::Asc };
        self
    }

    /// Compare lines or string keys ignoring case
    pub fn with_ignore_case(mut self, ignore_case: bool) -> SortRequest {
        self.ignore_case = ignore_case;
        self
    }

    /// When true the first line is written first and unsorted. The default is true
    pub fn with_has_header_line(mut self, has_header_line: bool) -> SortRequest {
        self.has_header_line = has_header_line;
        self
    }

    /// Keep empty and whitespace only lines. The default is to drop them
    pub fn with_keep_empty_lines(mut self, keep_empty_lines: bool) -> SortRequest {
        self.keep_empty_lines = keep_empty_lines;
        self
    }

    /// Sort by a 1-based column. A column of 0 sorts complete lines
    pub fn with_sort_column(mut self, sort_column: usize) -> SortRequest {
        self.sort_column = sort_column;
        self
    }

    /// Set the column delimiter. The default is '\t'
    pub fn with_column_delimiter(mut self, column_delimiter: char) -> SortRequest {
        self.column_delimiter = column_delimiter;
        self
    }

    /// Compare the sort column as a number. Values that fail to parse compare as 0
    pub fn with_sort_column_is_numeric(mut self, sort_column_is_numeric: bool) -> SortRequest {
        self.sort_column_is_numeric = sort_column_is_numeric;
        self
    }

    /// Files up to this size are sorted in memory
    pub fn with_max_in_memory_sort_size_mb(mut self, size_mb: u64) -> SortRequest {
        self.max_in_memory_sort_size_mb = size_mb;
        self.max_in_memory_sort_size_bytes = None;
        self
    }

    /// Byte precise version of [SortRequest::with_max_in_memory_sort_size_mb]. Not subject to the
    /// 10 MB floor, 0 forces a disk backed sort of any non empty file
    pub fn with_max_in_memory_sort_size_bytes(mut self, size_bytes: u64) -> SortRequest {
        self.max_in_memory_sort_size_bytes = Some(size_bytes);
        self
    }

    /// The input is split into sorted chunks of about this size
    pub fn with_chunk_size_mb(mut self, chunk_size_mb: u64) -> SortRequest {
        self.chunk_size_mb = chunk_size_mb;
        self.chunk_size_bytes = None;
        self
    }

    /// Byte precise version of [SortRequest::with_chunk_size_mb]. Not subject to the 1 MB floor
    pub fn with_chunk_size_bytes(mut self, chunk_size_bytes: u64) -> SortRequest {
        self.chunk_size_bytes = Some(chunk_size_bytes);
        self
    }

    /// Set directory for chunk files. By default use std::env::temp_dir()
    /// It is recommended for large files to create a dedicated directory for intermediate files
    /// on the same file system as the output target
    pub fn with_working_directory(mut self, working_directory: PathBuf) -> SortRequest {
        self.working_directory = working_directory;
        self
    }

    /// Leave chunk files on disk after the sort
    pub fn with_keep_temp_files(mut self, keep_temp_files: bool) -> SortRequest {
        self.keep_temp_files = keep_temp_files;
        self
    }

    /// Set the prefix of chunk file names
    pub fn with_tmp_prefix(mut self, tmp_prefix: String) -> SortRequest {
        self.tmp_prefix = tmp_prefix;
        self
    }

    /// Specify which lines to ignore. Each line matching the regex will be ignored and will not
    /// appear in the output. The header line is never matched against it.
    pub fn with_ignore_lines(mut self, r: Regex) -> SortRequest {
        self.ignore_lines = Some(r);
        self
    }
}
