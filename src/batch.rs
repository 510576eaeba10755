use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// A deserialized source row and the line it started on.
#[derive(Debug, Clone)]
pub struct Row<T> {
    pub line: u64,
    pub value: T,
}

/// Open a source file, decompressing `.gz` inputs on the fly.
pub fn open_source(path: &Path) -> Result<Box<dyn Read>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "gz") {
        Box::new(GzDecoder::new(BufReader::with_capacity(2 * 1024 * 1024, file)))
    } else {
        Box::new(BufReader::with_capacity(2 * 1024 * 1024, file))
    };
    Ok(reader)
}

/// Comma-delimited, minimally quoted, `\n`-terminated output.
pub fn output_writer<W: Write>(output: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(output)
}

/// Reads a delimited source in fixed-size row batches.
pub struct BatchReader<R: Read> {
    reader: csv::Reader<R>,
    headers: StringRecord,
    record: StringRecord,
    batch_size: usize,
}

impl<R: Read> BatchReader<R> {
    /// Wrap `input`, failing unless its header names every `required` column.
    pub fn new(input: R, delimiter: u8, batch_size: usize, required: &[&str]) -> Result<Self> {
        if batch_size == 0 {
            bail!("batch size must be at least 1");
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(input);
        let headers = reader.headers().context("failed to read header row")?.clone();

        for column in required {
            if !headers.iter().any(|h| h == *column) {
                bail!("missing required column `{}`", column);
            }
        }

        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
            batch_size,
        })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Refill `batch` with up to `batch_size` rows. Returns `false` once
    /// the input is exhausted and nothing was read.
    ///
    /// Short rows are kept and their trailing columns read as absent; a row
    /// with more fields than the header is malformed.
    pub fn next_batch<T: DeserializeOwned>(&mut self, batch: &mut Vec<Row<T>>) -> Result<bool> {
        batch.clear();

        while batch.len() < self.batch_size {
            if !self.reader.read_record(&mut self.record)? {
                break;
            }
            let line = self.record.position().map(|p| p.line()).unwrap_or_default();
            if self.record.len() > self.headers.len() {
                bail!(
                    "malformed row at line {}: {} fields, header has {}",
                    line,
                    self.record.len(),
                    self.headers.len()
                );
            }
            let value = self
                .record
                .deserialize(Some(&self.headers))
                .with_context(|| format!("malformed row at line {}", line))?;
            batch.push(Row { line, value });
        }

        Ok(!batch.is_empty())
    }
}
