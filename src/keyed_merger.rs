use std::collections::BTreeMap;
use std::io::Write;

use anyhow::{anyhow, Context};

use crate::chunk_reader::ChunkReader;
use crate::config::Config;
use crate::key::{extract_string_key, Key};
use crate::notifier::Notifier;
use crate::order::Order;
use crate::sorted_chunk_file::SortedChunkFile;
use crate::sorted_output::SortedOutput;
use crate::temp_file::TempFileManager;

/// K-way merge of sorted chunk files for column sorts.
///
/// The frontier is an ordered map from key to the lines currently holding that key, each tagged
/// with the chunk it came from. The extreme key for the order is taken as a whole bucket and its
/// chunks are drained in chunk order while they hold that key, which keeps lines with equal keys
/// in input order.
pub(crate) struct KeyedMerger<'a> {
    config: &'a Config,
    notifier: &'a dyn Notifier,
}

impl<'a> KeyedMerger<'a> {
    pub(crate) fn new(config: &'a Config, notifier: &'a dyn Notifier) -> KeyedMerger<'a> {
        KeyedMerger {
            config,
            notifier,
        }
    }

    /// Merge `chunks` into `writer` after writing `header`. Exhausted chunk files are released
    /// through `temp_files`. Returns the number of data lines written.
    pub(crate) fn merge<W: Write>(
        &self,
        chunks: &[SortedChunkFile],
        header: &Option<String>,
        data_lines: u64,
        writer: &mut W,
        temp_files: &mut TempFileManager,
    ) -> Result<u64, anyhow::Error> {
        self.internal_merge(chunks, header, data_lines, writer, temp_files)
            .with_context(|| "merge phase")
    }

    fn internal_merge<W: Write>(
        &self,
        chunks: &[SortedChunkFile],
        header: &Option<String>,
        data_lines: u64,
        writer: &mut W,
        temp_files: &mut TempFileManager,
    ) -> Result<u64, anyhow::Error> {
        if self.config.field().whole_line() {
            return Err(anyhow!("keyed merge requires a sort column"));
        }
        let mut output = SortedOutput::new(writer, self.notifier, data_lines);
        output.write_header(header)?;

        let mut readers: Vec<Option<ChunkReader>> = Vec::with_capacity(chunks.len());
        let mut frontier: BTreeMap<Key, Vec<(usize, String)>> = BTreeMap::new();

        for (source, chunk) in chunks.iter().enumerate() {
            let mut reader = ChunkReader::open(chunk.path())?;
            match reader.next_line()? {
                Some(line) => {
                    frontier.entry(self.key(&line)).or_default().push((source, line));
                    readers.push(Some(reader));
                }
                None => {
                    drop(reader);
                    temp_files.release(chunk.path());
                    readers.push(None);
                }
            }
        }

        loop {
            let bucket = match self.config.order() {
                Order::Asc => frontier.pop_first(),
                Order::Desc => frontier.pop_last(),
            };
            let Some((key, mut lines)) = bucket else {
                break;
            };

            // chunks hold consecutive ranges of the input, so chunk order is input order
            lines.sort_by_key(|(source, _)| *source);
            for (source, line) in lines {
                output.write_line(line.as_str())?;
                self.drain_equal(&key, source, &mut readers, &mut frontier, &mut output, temp_files)?;
            }
        }

        output.finish()
    }

    /// Write the following lines of chunk `source` while they hold `key`, then put its first line
    /// with a different key back on the frontier or release the exhausted chunk.
    fn drain_equal<W: Write>(
        &self,
        key: &Key,
        source: usize,
        readers: &mut [Option<ChunkReader>],
        frontier: &mut BTreeMap<Key, Vec<(usize, String)>>,
        output: &mut SortedOutput<W>,
        temp_files: &mut TempFileManager,
    ) -> Result<(), anyhow::Error> {
        loop {
            let next = match readers[source].as_mut() {
                Some(reader) => reader.next_line()?,
                None => None,
            };
            match next {
                Some(line) => {
                    let next_key = self.key(&line);
                    if next_key == *key {
                        output.write_line(line.as_str())?;
                    } else {
                        frontier.entry(next_key).or_default().push((source, line));
                        return Ok(());
                    }
                }
                None => {
                    if let Some(reader) = readers[source].take() {
                        let path = reader.path().clone();
                        drop(reader);
                        temp_files.release(&path);
                    }
                    return Ok(());
                }
            }
        }
    }

    fn key(&self, line: &str) -> Key {
        let field = self.config.field();
        Key::new(extract_string_key(line, field.separator(), field.index()), field.field_type(), field.ignore_case())
    }
}
