use std::cell::RefCell;
use std::fs;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use data_encoding::HEXLOWER;
use rand::Rng;

use flex_file_sort::memory::{MemoryProbe, MB};
use flex_file_sort::notifier::Notifier;
use flex_file_sort::sort::{Sort, SortSummary};
use flex_file_sort::sort_request::SortRequest;

pub fn setup() {
    let results_dir_path = PathBuf::from_str("./target/results/").unwrap();

    if !results_dir_path.exists() {
        fs::create_dir_all(&results_dir_path).unwrap_or_else(|_|
            panic!("Failed to create results directory: {:?}", results_dir_path)
        );
    } else {
        println!("Results directory exists at {:?}", results_dir_path);
    }
}

#[allow(dead_code)]
pub fn read_lines(path: &Path) -> Result<Vec<String>, anyhow::Error> {
    let reader = BufReader::new(File::open(path)?);
    let lines = reader.lines().map(|x| x.unwrap()).collect();
    Ok(lines)
}

#[allow(dead_code)]
pub fn write_lines(path: &Path, lines: &[String]) -> Result<(), anyhow::Error> {
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(writer, "{}", line)?;
    }
    writer.flush()?;
    Ok(())
}

#[allow(dead_code)]
pub fn temp_file_name(dir: &str) -> PathBuf {
    let mut result = PathBuf::from(dir);
    let name = HEXLOWER.encode(&rand::random::<[u8; 16]>());
    result.push(name);
    result
}

/// Random lines of lowercase and uppercase letters, duplicates and blank lines included
#[allow(dead_code)]
pub fn random_lines(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            if i % 97 == 0 {
                String::new()
            } else if i % 89 == 0 {
                "duplicate".to_string()
            } else {
                let len = rng.gen_range(1..12);
                (0..len)
                    .map(|_| {
                        let c = rng.gen_range(b'a'..=b'z') as char;
                        if rng.gen_bool(0.3) { c.to_ascii_uppercase() } else { c }
                    })
                    .collect()
            }
        })
        .collect()
}

/// Tab separated records `<id>\t<name>\t<value>` with unique ids and values
#[allow(dead_code)]
pub fn random_records(count: usize) -> Vec<String> {
    let mut rng = rand::thread_rng();
    let mut ids: Vec<usize> = (0..count).collect();
    rand::seq::SliceRandom::shuffle(ids.as_mut_slice(), &mut rng);
    ids.iter()
        .map(|id| format!("{:x}-{}\tname-{}\t{}", id * 7919 % 104_729, id, rng.gen_range(0..1000), *id as f64 * 1.5 - 300.0))
        .collect()
}

#[allow(dead_code)]
pub struct FixedMemory(pub u64);

impl MemoryProbe for FixedMemory {
    fn available_memory_bytes(&self) -> Result<u64, anyhow::Error> {
        Ok(self.0 * MB)
    }
}

/// Notifications collected during a sort, shared with the test through an `Rc`
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct Recorded {
    pub statuses: Rc<RefCell<Vec<String>>>,
    pub warnings: Rc<RefCell<Vec<String>>>,
    pub errors: Rc<RefCell<Vec<String>>>,
    pub phases: Rc<RefCell<Vec<(String, f32)>>>,
}

impl Notifier for Recorded {
    fn status(&self, message: &str) {
        self.statuses.borrow_mut().push(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.warnings.borrow_mut().push(message.to_string());
    }

    fn error(&self, message: &str, cause: Option<&anyhow::Error>) {
        let message = match cause {
            None => message.to_string(),
            Some(e) => format!("{}: {:#}", message, e),
        };
        self.errors.borrow_mut().push(message);
    }

    fn progress(&self, phase: &str, percent_complete: f32) {
        self.phases.borrow_mut().push((phase.to_string(), percent_complete));
    }
}

/// Sort `input` into `output` assuming 4 GB of available memory
#[allow(dead_code)]
pub fn run_sort(input: &Path, output: &Path, request: SortRequest) -> Result<SortSummary, anyhow::Error> {
    let mut sort = Sort::new(input.to_path_buf(), output.to_path_buf(), request);
    sort.with_memory_probe(Box::new(FixedMemory(4096)));
    sort.sort()
}

/// Request forcing the disk backed sort with chunks of about `chunk_size_bytes`
#[allow(dead_code)]
pub fn disk_request(working_directory: &Path, chunk_size_bytes: u64) -> SortRequest {
    SortRequest::default()
        .with_working_directory(working_directory.to_path_buf())
        .with_max_in_memory_sort_size_bytes(0)
        .with_chunk_size_bytes(chunk_size_bytes)
}
