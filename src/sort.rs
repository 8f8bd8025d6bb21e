use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
#[cfg(unix)]
use rlimit::{getrlimit, setrlimit, Resource};
use tempfile::NamedTempFile;

use crate::chunk_reader::read_line;
use crate::chunk_splitter::ChunkSplitter;
use crate::config::Config;
use crate::heap_merger::HeapMerger;
use crate::in_memory::InMemorySorter;
use crate::keyed_merger::KeyedMerger;
use crate::line_record::LineRecord;
use crate::memory::{MemoryBudgetAdvisor, MemoryProbe, SysinfoProbe};
use crate::notifier::{LogNotifier, Notifier};
use crate::sort_request::SortRequest;
use crate::temp_file::TempFileManager;

const SORTED_SUFFIX: &str = "_Sorted";
const RESERVED_OPEN_FILES: u64 = 256;

/// How a sort was carried out
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortMode {
    /// The whole input was sorted in memory
    InMemory,
    /// The input was split into sorted chunk files which were then merged
    Disk,
}

/// Outcome of a successful [Sort::sort]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SortSummary {
    mode: SortMode,
    data_lines: u64,
    chunks: usize,
}

impl SortSummary {
    pub fn mode(&self) -> SortMode {
        self.mode
    }

    /// Data lines written to the output, the header is not counted
    pub fn data_lines(&self) -> u64 {
        self.data_lines
    }

    /// Number of chunk files, 0 for in-memory sorts
    pub fn chunks(&self) -> usize {
        self.chunks
    }
}

/// Sort a delimited text file by whole lines or by a column.
///
/// Inputs not larger than the in-memory threshold are sorted in memory. Larger inputs are split
/// into sorted chunk files in the working directory and merged into the output.
///
/// The output is staged next to its final location and only moved into place when the sort
/// succeeds, so a failed sort leaves no partial output and input and output may be the same file.
///
/// # Examples
/// ```
/// use std::path::PathBuf;
/// use flex_file_sort::sort::Sort;
/// use flex_file_sort::sort_request::SortRequest;
///
/// fn sort_by_second_column(input: PathBuf, output: PathBuf, tmp: PathBuf) -> Result<(), anyhow::Error> {
///     let request = SortRequest::default()
///         .with_sort_column(2)
///         .with_column_delimiter(',')
///         .with_sort_column_is_numeric(true)
///         // for large files use a dedicated directory for the chunk files, preferably on the
///         // same file system as the output
///         .with_working_directory(tmp);
///     let sort = Sort::new(input, output, request);
///     let summary = sort.sort()?;
///     log::info!("sorted {} lines", summary.data_lines());
///     Ok(())
/// }
/// ```
pub struct Sort {
    input: PathBuf,
    output: PathBuf,
    request: SortRequest,
    notifier: Box<dyn Notifier>,
    probe: Box<dyn MemoryProbe>,
}

impl Sort {
    /// Create a Sort of `input` into `output`. Notifications go to the `log` facade and available
    /// memory is queried with `sysinfo`.
    pub fn new(input: PathBuf, output: PathBuf, request: SortRequest) -> Sort {
        Sort {
            input,
            output,
            request,
            notifier: Box::new(LogNotifier),
            probe: Box::new(SysinfoProbe),
        }
    }

    /// Receive status, warning, error and progress notifications
    pub fn with_notifier(&mut self, notifier: Box<dyn Notifier>) {
        self.notifier = notifier;
    }

    /// Replace the source of the available memory figure
    pub fn with_memory_probe(&mut self, probe: Box<dyn MemoryProbe>) {
        self.probe = probe;
    }

    pub fn input(&self) -> &PathBuf {
        &self.input
    }

    pub fn output(&self) -> &PathBuf {
        &self.output
    }

    pub fn request(&self) -> &SortRequest {
        &self.request
    }

    /// Sort the input into the output.
    ///
    /// A missing input is reported through [Notifier::error] and returned as an error without
    /// creating the output.
    pub fn sort(&self) -> Result<SortSummary, anyhow::Error> {
        log::info!("Start sort, input: {}, output: {}", self.input.display(), self.output.display());
        match self.internal_sort() {
            Ok(summary) => {
                log::info!(
                    "Finish sort, mode: {:?}, lines: {}, chunks: {}",
                    summary.mode(),
                    summary.data_lines(),
                    summary.chunks()
                );
                Ok(summary)
            }
            Err(e) => {
                self.notifier.error(format!("Failed to sort {}", self.input.display()).as_str(), Some(&e));
                Err(e)
            }
        }
    }

    /// Check whether the input is already ordered under the request. The header line and filtered
    /// lines are skipped.
    pub fn check(&self) -> Result<bool, anyhow::Error> {
        let config = self.create_config();
        Self::internal_check(&self.input, &config)
    }

    fn create_config(&self) -> Config {
        let advisor = MemoryBudgetAdvisor::new(self.probe.as_ref(), self.notifier.as_ref());
        log::info!("Available memory: {:.0} MB", advisor.available_memory_mb());
        Config::new(&self.request, &advisor, self.notifier.as_ref())
    }

    fn internal_sort(&self) -> Result<SortSummary, anyhow::Error> {
        if !self.input.is_file() {
            return Err(anyhow!("Input file not found: {}", self.input.display()));
        }
        let input_len = std::fs::metadata(&self.input)
            .with_context(|| format!("path: {}", self.input.display()))?
            .len();

        let config = self.create_config();
        self.notifier.status(format!("Sorting {}: {}", self.input.display(), config.describe()).as_str());

        let output_dir = output_dir(&self.output);
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("create output directory: {}", output_dir.display()))?;
        let mut staged = staging_file(&output_dir, &self.output)?;

        let summary = self.sort_into(&config, input_len, &mut staged)?;

        staged.persist(&self.output)
            .with_context(|| format!("persist sorted output to: {}", self.output.display()))?;
        Ok(summary)
    }

    fn sort_into(&self, config: &Config, input_len: u64, staged: &mut NamedTempFile) -> Result<SortSummary, anyhow::Error> {
        let input = File::open(&self.input).with_context(|| format!("path: {}", self.input.display()))?;
        let mut reader = BufReader::new(input);
        let mut writer = BufWriter::new(staged.as_file_mut());

        let summary = if input_len <= config.in_memory_threshold_bytes() {
            log::info!("Sorting {} bytes in memory", input_len);
            let lines = InMemorySorter::new(config, self.notifier.as_ref())
                .sort(&mut reader, input_len, &mut writer)?;
            SortSummary {
                mode: SortMode::InMemory,
                data_lines: lines,
                chunks: 0,
            }
        } else {
            log::info!(
                "Sorting {} bytes on disk, chunk size: {} bytes, working directory: {}",
                input_len,
                config.chunk_size_bytes(),
                config.tmp().display()
            );
            self.disk_sort(config, &mut reader, input_len, &mut writer)?
        };
        writer.flush().with_context(|| format!("path: {}", self.output.display()))?;
        Ok(summary)
    }

    fn disk_sort<W: Write>(
        &self,
        config: &Config,
        reader: &mut BufReader<File>,
        input_len: u64,
        writer: &mut W,
    ) -> Result<SortSummary, anyhow::Error> {
        let notifier = self.notifier.as_ref();
        std::fs::create_dir_all(config.tmp())
            .with_context(|| format!("create working directory: {}", config.tmp().display()))?;
        let mut temp_files = TempFileManager::new(config);

        notifier.status("Caching data to disk");
        let split = ChunkSplitter::new(config, notifier)
            .split(reader, input_len, &mut temp_files)
            .with_context(|| "split phase")?;
        let chunks = split.chunks().len();
        let chunk_bytes: u64 = split.chunks().iter().map(|chunk| chunk.bytes()).sum();
        log::info!("Split phase done, chunks: {}, bytes: {}", chunks, chunk_bytes);

        notifier.status(format!("Merging {} chunks, {} lines", chunks, split.data_lines()).as_str());
        let limits = raise_open_files_limit(chunks as u64)?;
        let merged = if config.field().whole_line() {
            HeapMerger::new(config, notifier)
                .merge(split.chunks(), split.header(), split.data_lines(), writer, &mut temp_files)
        } else {
            KeyedMerger::new(config, notifier)
                .merge(split.chunks(), split.header(), split.data_lines(), writer, &mut temp_files)
        };
        let merged = merged_with_restored_limit(merged, restore_open_files_limit(limits), notifier);

        if temp_files.keep() {
            notifier.status(format!("Keeping chunk files in {}", config.tmp().display()).as_str());
        }
        temp_files.cleanup();

        let lines = merged?;
        if lines != split.data_lines() {
            return Err(
                anyhow!("merge phase: wrote {} lines, chunks hold {} lines", lines, split.data_lines())
            );
        }
        Ok(
            SortSummary {
                mode: SortMode::Disk,
                data_lines: lines,
                chunks,
            }
        )
    }

    pub(crate) fn internal_check(path: &PathBuf, config: &Config) -> Result<bool, anyhow::Error> {
        let file = File::open(path).with_context(|| format!("path: {}", path.display()))?;
        let mut reader = BufReader::new(file);
        if config.has_header_line() {
            read_line(&mut reader)?;
        }

        let mut previous: Option<LineRecord> = None;
        while let Some(line) = read_line(&mut reader)? {
            if config.is_filtered(&line) {
                continue;
            }
            let current = LineRecord::new(line, config.field(), config.order());
            match previous {
                None => {
                    previous = Some(current);
                }
                Some(previous_record) => {
                    if previous_record <= current {
                        previous = Some(current);
                    } else {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }
}

/// Sort `input` into `output`, reporting through `notifier`. Returns true on success; failures
/// are reported with [Notifier::error].
pub fn sort_file(input: PathBuf, output: PathBuf, request: SortRequest, notifier: Box<dyn Notifier>) -> bool {
    let mut sort = Sort::new(input, output, request);
    sort.with_notifier(notifier);
    sort.sort().is_ok()
}

/// Output path for sorting `input` into `output_dir`.
///
/// When `output_dir` is empty or is the directory of the input, the output is written beside the
/// input as `<stem>_Sorted<.ext>`. Otherwise the input file name is used inside `output_dir`.
///
/// # Examples
/// ```
/// use std::path::{Path, PathBuf};
/// use flex_file_sort::sort::output_path_for;
///
/// assert_eq!(output_path_for(Path::new("data/in.csv"), Path::new("")), PathBuf::from("data/in_Sorted.csv"));
/// assert_eq!(output_path_for(Path::new("data/in.csv"), Path::new("data")), PathBuf::from("data/in_Sorted.csv"));
/// assert_eq!(output_path_for(Path::new("data/in.csv"), Path::new("out")), PathBuf::from("out/in.csv"));
/// ```
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let input_dir = input.parent().unwrap_or(Path::new(""));
    if output_dir.as_os_str().is_empty() || output_dir == input_dir {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        let name = match input.extension() {
            None => {
                format!("{}{}", stem, SORTED_SUFFIX)
            }
            Some(extension) => {
                format!("{}{}.{}", stem, SORTED_SUFFIX, extension.to_string_lossy())
            }
        };
        input.with_file_name(name)
    } else {
        output_dir.join(input.file_name().unwrap_or_default())
    }
}

fn output_dir(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            parent.to_path_buf()
        }
        _ => {
            PathBuf::from(".")
        }
    }
}

/// Staging file for `output` in `output_dir`. It takes the permissions of an existing output,
/// which covers sorting a file in place, and otherwise those of a newly created file.
fn staging_file(output_dir: &Path, output: &Path) -> Result<NamedTempFile, anyhow::Error> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".flex-file-sort-").suffix(".partial");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // the process umask applies on creation
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let staged = builder.tempfile_in(output_dir)
        .with_context(|| format!("create staging file in: {}", output_dir.display()))?;
    if let Ok(metadata) = std::fs::metadata(output) {
        staged.as_file().set_permissions(metadata.permissions())
            .with_context(|| format!("copy permissions of: {}", output.display()))?;
    }
    Ok(staged)
}

/// A failure to restore the open files limit is reported as a warning and never hides the outcome
/// of the merge.
fn merged_with_restored_limit(
    merged: Result<u64, anyhow::Error>,
    restored: Result<(), anyhow::Error>,
    notifier: &dyn Notifier,
) -> Result<u64, anyhow::Error> {
    if let Err(e) = restored {
        notifier.warning(format!("Failed to restore the open files limit: {:#}", e).as_str());
    }
    merged
}

#[cfg(unix)]
fn raise_open_files_limit(chunks: u64) -> Result<(u64, u64), anyhow::Error> {
    let (current_soft, current_hard) = getrlimit(Resource::NOFILE).with_context(|| "getrlimit")?;
    log::info!("Current rlimit NOFILE, soft: {}, hard: {}", current_soft, current_hard);
    let new_soft = (chunks + RESERVED_OPEN_FILES).max(current_soft).min(current_hard);
    if new_soft != current_soft {
        log::info!("Set new rlimit NOFILE, soft: {}, hard: {}", new_soft, current_hard);
        set_rlimits(new_soft, current_hard)?;
    }
    Ok((current_soft, current_hard))
}

#[cfg(unix)]
fn restore_open_files_limit(limits: (u64, u64)) -> Result<(), anyhow::Error> {
    let (soft, hard) = limits;
    let (current_soft, _) = getrlimit(Resource::NOFILE).with_context(|| "getrlimit")?;
    if current_soft != soft {
        log::info!("Restore rlimit NOFILE, soft: {}, hard: {}", soft, hard);
        set_rlimits(soft, hard)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_rlimits(soft: u64, hard: u64) -> Result<(), anyhow::Error> {
    setrlimit(Resource::NOFILE, soft, hard)
        .with_context(|| format!("set rlimit NOFILE, soft: {}, hard: {}", soft, hard))?;
    Ok(())
}

#[cfg(not(unix))]
fn raise_open_files_limit(_chunks: u64) -> Result<(u64, u64), anyhow::Error> {
    Ok((0, 0))
}

#[cfg(not(unix))]
fn restore_open_files_limit(_limits: (u64, u64)) -> Result<(), anyhow::Error> {
    Ok(())
}
