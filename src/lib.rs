//! This crate sorts delimited text files, for example CSV or TSV, by complete lines or by the value
//! of a single column.
//!
//! Columns are compared as text or as numbers, in ascending or descending order, with or without
//! case sensitivity. A header line can be kept in place and blank lines can be dropped or kept.
//!
//! Files that fit the in-memory budget are sorted in a single pass. Larger files are split into
//! sorted chunk files, which are then merged: a heap merge for whole line sorts and an ordered
//! multimap merge keyed by the column value for column sorts. The in-memory threshold and the chunk
//! size are capped by the memory available on the machine.
//!
//! # Examples
//! ```
//! use std::path::PathBuf;
//! use flex_file_sort::sort::Sort;
//! use flex_file_sort::sort_request::SortRequest;
//!
//! // optimized for use with Jemalloc
//! use tikv_jemallocator::Jemalloc;
//! #[global_allocator]
//! static GLOBAL: Jemalloc = Jemalloc;
//!
//! // reverse numeric sort of a CSV file by its third column
//! fn sort_records(input: PathBuf, output: PathBuf, tmp: PathBuf) -> Result<(), anyhow::Error> {
//!     let request = SortRequest::default()
//!         .with_sort_column(3)
//!         .with_column_delimiter(',')
//!         .with_sort_column_is_numeric(true)
//!         .with_reverse(true)
//!         // files larger than 100 MB are sorted on disk in chunks of 20 MB
//!         .with_max_in_memory_sort_size_mb(100)
//!         .with_chunk_size_mb(20)
//!         // set the directory for chunk files. The default is the system temp dir -
//!         // std::env::temp_dir(), however, for large files it is recommended to provide a
//!         // dedicated directory, preferably on the same file system as the output.
//!         .with_working_directory(tmp);
//!
//!     Sort::new(input, output, request).sort()?;
//!     Ok(())
//! }
//! ```
//!

pub(crate) mod line_record;
pub(crate) mod field;
pub(crate) mod sorted_chunk_file;
pub(crate) mod config;
pub(crate) mod chunk_reader;
pub(crate) mod chunk_splitter;
pub(crate) mod sorted_output;
pub(crate) mod heap_merger;
pub(crate) mod keyed_merger;
pub(crate) mod in_memory;
pub(crate) mod temp_file;

pub mod sort;
pub mod sort_request;
pub mod key;
pub mod binary_heap;
pub mod memory;
pub mod notifier;
pub mod field_type;
pub mod order;
