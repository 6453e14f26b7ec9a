//! CSV source reading.
//!
//! The first line is always a header. A record shorter than the header is
//! kept as is; its missing cells read as empty and fail coercion for that
//! row alone. A record longer than the header is a source parse error.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use ohlcv_core::{Error, RawRecord, RawTable, Result};

fn source_error(err: csv::Error) -> Error {
    Error::source_read(err.to_string())
}

fn open_file(path: &Path) -> Result<File> {
    File::open(path)
        .map_err(|e| Error::source_read(format!("open '{}': {e}", path.display())))
}

fn build_reader<R: Read>(source: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source)
}

fn read_headers<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<String>> {
    let headers: Vec<String> = reader
        .headers()
        .map_err(source_error)?
        .iter()
        .map(String::from)
        .collect();

    if headers.is_empty() {
        return Err(Error::source_read("source has no header row"));
    }
    Ok(headers)
}

fn to_raw(record: &StringRecord, width: usize) -> Result<RawRecord> {
    if record.len() > width {
        let line = record.position().map_or(0, |p| p.line());
        return Err(Error::source_read(format!(
            "line {line}: expected {width} fields, saw {}",
            record.len()
        )));
    }
    Ok(RawRecord::new(record.iter()))
}

/// Read an entire CSV file into memory.
pub fn read_table(path: &Path) -> Result<RawTable> {
    read_table_from(open_file(path)?)
}

/// Read an entire CSV source into memory.
pub fn read_table_from<R: Read>(source: R) -> Result<RawTable> {
    let mut reader = build_reader(source);
    let headers = read_headers(&mut reader)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(to_raw(&record.map_err(source_error)?, headers.len())?);
    }

    Ok(RawTable { headers, rows })
}

/// Streams a CSV source as fixed-size windows of rows.
///
/// Every yielded table carries the source headers. The last window may be
/// shorter than `chunk_size`; an empty source yields nothing. After the
/// first error the reader is exhausted.
pub struct ChunkReader<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    chunk_size: usize,
    record: StringRecord,
    done: bool,
}

impl ChunkReader<File> {
    /// Open a CSV file for windowed reading.
    pub fn open(path: &Path, chunk_size: usize) -> Result<Self> {
        Self::from_reader(open_file(path)?, chunk_size)
    }
}

impl<R: Read> ChunkReader<R> {
    /// Wrap any reader. Reads the header row immediately.
    pub fn from_reader(source: R, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::config("chunk size must be greater than zero"));
        }

        let mut reader = build_reader(source);
        let headers = read_headers(&mut reader)?;

        Ok(Self {
            reader,
            headers,
            chunk_size,
            record: StringRecord::new(),
            done: false,
        })
    }

    /// Source header names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn next_chunk(&mut self) -> Result<Option<RawTable>> {
        let mut rows = Vec::with_capacity(self.chunk_size);

        while rows.len() < self.chunk_size {
            if !self.reader.read_record(&mut self.record).map_err(source_error)? {
                break;
            }
            rows.push(to_raw(&self.record, self.headers.len())?);
        }

        if rows.is_empty() {
            return Ok(None);
        }

        Ok(Some(RawTable {
            headers: self.headers.clone(),
            rows,
        }))
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = Result<RawTable>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_chunk() {
            Ok(Some(table)) => Some(Ok(table)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
