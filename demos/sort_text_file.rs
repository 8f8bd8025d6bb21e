use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Error;
use rand::Rng;
use simple_logger::SimpleLogger;

use flex_file_sort::order::Order;
use flex_file_sort::sort::{output_path_for, Sort};
use flex_file_sort::sort_request::SortRequest;

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn create_input(path: &Path, lines: usize) -> Result<(), Error> {
    let mut rng = rand::thread_rng();
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "id,name,score")?;
    for i in 0..lines {
        writeln!(writer, "{},name-{:04x},{:.2}", i, rng.gen::<u16>(), rng.gen_range(0.0..100.0_f64))?;
    }
    writer.flush()?;
    Ok(())
}

fn sort_lines_ascending(input_path: &Path, output_path: &Path) -> Result<(), Error> {
    // ascending order is the default
    let sort = Sort::new(input_path.to_path_buf(), output_path.to_path_buf(), SortRequest::default());
    sort.sort()?;
    Ok(())
}

fn sort_scores_descending(input_path: &Path, output_path: &Path) -> Result<(), Error> {
    let request = SortRequest::default()
        .with_sort_column(3)
        .with_column_delimiter(',')
        .with_sort_column_is_numeric(true)
        .with_order(Order::Desc);
    Sort::new(input_path.to_path_buf(), output_path.to_path_buf(), request).sort()?;
    Ok(())
}

fn sort_names_on_disk(input_path: &Path, output_path: &Path, tmp: &Path) -> Result<(), Error> {
    // force the external sort with 1 MB chunks
    let request = SortRequest::default()
        .with_sort_column(2)
        .with_column_delimiter(',')
        .with_ignore_case(true)
        .with_max_in_memory_sort_size_bytes(0)
        .with_chunk_size_mb(1)
        .with_working_directory(tmp.to_path_buf());
    let summary = Sort::new(input_path.to_path_buf(), output_path.to_path_buf(), request).sort()?;
    log::info!("Merged {} chunks", summary.chunks());
    Ok(())
}

// cargo run -r --example sort_text_file
pub fn main() -> Result<(), Error> {
    SimpleLogger::new().init()?;
    let input_path = PathBuf::from("./target/scores-100000.csv");
    let ascending_path = output_path_for(&input_path, Path::new(""));
    let descending_path = PathBuf::from("./target/scores-desc-100000.csv");
    let names_path = PathBuf::from("./target/names-100000.csv");
    let tmp_path = PathBuf::from("./target/sort-tmp");

    create_input(&input_path, 100_000)?;
    sort_lines_ascending(&input_path, &ascending_path)?;
    sort_scores_descending(&input_path, &descending_path)?;
    sort_names_on_disk(&input_path, &names_path, &tmp_path)?;

    Ok(())
}
