use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use data_encoding::HEXLOWER;

use crate::config::Config;

const MAX_RANDOM_NAME_ATTEMPTS: usize = 255;
const MAX_OPEN_FAILURES: usize = 3;
const RANDOM_SUFFIX_BYTES: usize = 4;

/// Delete `path`, ignoring any error. Stale temp files are acceptable, a failed cleanup never
/// fails a sort.
pub(crate) fn delete_ignoring_errors(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        log::debug!("Failed to remove {}: {}", path.display(), e);
    }
}

/// Creates chunk files named `<prefix><chunk-index>_<random>.tmp` in the working directory and
/// owns them until they are released. Files still owned when the manager is dropped are deleted
/// unless temp files are kept.
pub(crate) struct TempFileManager {
    dir: PathBuf,
    prefix: String,
    suffix: String,
    random_bytes: usize,
    keep: bool,
    created: Vec<PathBuf>,
}

impl TempFileManager {
    pub(crate) fn new(config: &Config) -> TempFileManager {
        TempFileManager {
            dir: config.tmp().clone(),
            prefix: config.tmp_prefix().clone(),
            suffix: config.tmp_suffix().clone(),
            random_bytes: RANDOM_SUFFIX_BYTES,
            keep: config.keep_temp_files(),
            created: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_random_bytes(mut self, random_bytes: usize) -> TempFileManager {
        self.random_bytes = random_bytes;
        self
    }

    pub(crate) fn keep(&self) -> bool {
        self.keep
    }

    fn candidate(&self, chunk_index: usize) -> PathBuf {
        let random: Vec<u8> = (0..self.random_bytes).map(|_| rand::random::<u8>()).collect();
        self.dir.join(
            format!(
                "{}{:03}_{}{}",
                self.prefix,
                chunk_index,
                HEXLOWER.encode(&random),
                self.suffix
            )
        )
    }

    /// Create a new, uniquely named chunk file for writing.
    ///
    /// Name collisions are retried with a new random name up to 255 times, other open failures
    /// up to 3 times. Exhausting either bound is an error.
    pub(crate) fn create_chunk_file(&mut self, chunk_index: usize) -> Result<(BufWriter<File>, PathBuf), anyhow::Error> {
        let mut names_tried = 0;
        let mut failures = 0;
        loop {
            let path = self.candidate(chunk_index);
            names_tried += 1;
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    self.created.push(path.clone());
                    return Ok((BufWriter::new(file), path));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if names_tried >= MAX_RANDOM_NAME_ATTEMPTS {
                        return Err(
                            anyhow!(
                                "Unable to create a new temp file after {} attempts (working directory is {})",
                                MAX_RANDOM_NAME_ATTEMPTS,
                                self.dir.display()
                            )
                        );
                    }
                }
                Err(e) => {
                    failures += 1;
                    log::warn!("Failed to create temp file {}: {}", path.display(), e);
                    if failures >= MAX_OPEN_FAILURES {
                        return Err(
                            anyhow!(e).context(format!("Unable to create temp file {}", path.display()))
                        );
                    }
                }
            }
        }
    }

    /// Give up ownership of a chunk file that is no longer needed, deleting it unless temp files
    /// are kept.
    pub(crate) fn release(&mut self, path: &Path) {
        self.created.retain(|p| p != path);
        if !self.keep {
            delete_ignoring_errors(path);
        }
    }

    /// Release every owned chunk file.
    pub(crate) fn cleanup(&mut self) {
        for path in std::mem::take(&mut self.created) {
            if !self.keep {
                delete_ignoring_errors(&path);
            }
        }
    }
}

impl Drop for TempFileManager {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::PathBuf;

    use crate::config::tests::config;
    use crate::sort_request::SortRequest;
    use crate::temp_file::TempFileManager;

    fn working_directory() -> PathBuf {
        tempfile::tempdir().unwrap().into_path()
    }

    #[test]
    fn test_create_and_cleanup() -> Result<(), anyhow::Error> {
        let dir = working_directory();
        let config = config(&SortRequest::default().with_working_directory(dir.clone()));
        let mut manager = TempFileManager::new(&config);
        let (mut writer, first) = manager.create_chunk_file(1)?;
        writeln!(writer, "line")?;
        drop(writer);
        let (_writer, second) = manager.create_chunk_file(1)?;
        assert_ne!(first, second);
        assert_eq!(first.parent(), Some(dir.as_path()));
        let name = first.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("FileSortSwap001_"), "{}", name);
        assert!(name.ends_with(".tmp"), "{}", name);
        assert_eq!(name.len(), "FileSortSwap001_".len() + 8 + ".tmp".len());

        manager.release(&first);
        assert!(!first.exists());
        assert!(second.exists());
        drop(manager);
        assert!(!second.exists());
        std::fs::remove_dir_all(dir)?;
        Ok(())
    }

    #[test]
    fn test_keep_temp_files() -> Result<(), anyhow::Error> {
        let dir = working_directory();
        let config = config(
            &SortRequest::default()
                .with_working_directory(dir.clone())
                .with_keep_temp_files(true)
        );
        let mut manager = TempFileManager::new(&config);
        let (_writer, first) = manager.create_chunk_file(7)?;
        let (_writer, second) = manager.create_chunk_file(8)?;
        manager.release(&first);
        drop(manager);
        assert!(first.exists());
        assert!(second.exists());
        std::fs::remove_dir_all(dir)?;
        Ok(())
    }

    #[test]
    fn test_name_exhaustion() -> Result<(), anyhow::Error> {
        let dir = working_directory();
        let config = config(&SortRequest::default().with_working_directory(dir.clone()));
        let mut manager = TempFileManager::new(&config).with_random_bytes(0);
        let (_writer, _path) = manager.create_chunk_file(1)?;
        let result = manager.create_chunk_file(1);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("after 255 attempts"));
        drop(manager);
        std::fs::remove_dir_all(dir)?;
        Ok(())
    }

    #[test]
    fn test_open_failure() {
        let dir = working_directory().join("missing");
        let config = config(&SortRequest::default().with_working_directory(dir));
        let mut manager = TempFileManager::new(&config);
        let result = manager.create_chunk_file(1);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unable to create temp file"));
    }
}
