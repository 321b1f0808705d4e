//! CSV records
//!
//! Parses delimited text into ordered column/value records and encodes a
//! window of records back into CSV text. The first row of a source is its
//! header; every later row becomes one [`Record`].

use std::path::Path;
use std::sync::Arc;

use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV encoding error: {0}")]
    Encode(String),
}

pub type RecordResult<T> = std::result::Result<T, RecordError>;

/// One parsed row: an ordered mapping from column name to cell value.
///
/// Rows parsed from the same source share their column list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<String>,
}

impl Record {
    /// Build a record from a column list and the leading values for it.
    /// Values past the end of `columns` are dropped.
    pub fn new(columns: Arc<[String]>, mut values: Vec<String>) -> Self {
        values.truncate(columns.len());
        Self { columns, values }
    }

    /// Convenience constructor from `(column, value)` pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let (columns, values): (Vec<String>, Vec<String>) = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .unzip();
        Self {
            columns: columns.into(),
            values,
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.iter().find(|(name, _)| *name == column).map(|(_, v)| v)
    }

    /// Columns present in this record, in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns[..self.values.len()].iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.columns().zip(self.values.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parse CSV text held in memory.
pub fn parse_records(data: &[u8]) -> RecordResult<Vec<Record>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(data);

    let mut rows = rdr.records();
    let header = match rows.next() {
        Some(row) => row?,
        None => return Ok(Vec::new()),
    };
    let layout = HeaderLayout::from_header(&header);

    let mut records = Vec::new();
    for row in rows {
        records.push(layout.record(&row?));
    }
    Ok(records)
}

/// Parse a CSV file from disk.
pub fn parse_file(path: &Path) -> RecordResult<Vec<Record>> {
    let data = std::fs::read(path)?;
    parse_records(&data)
}

/// Encode records as CSV text.
///
/// The header is the union of every record's columns in first-seen order.
/// Every present value is quoted; a column the record lacks is written as a
/// bare empty field. Rows are joined with `\n` (no trailing newline).
pub fn encode_records(records: &[Record]) -> RecordResult<String> {
    let mut fields: Vec<&str> = Vec::new();
    for record in records {
        for column in record.columns() {
            if !fields.contains(&column) {
                fields.push(column);
            }
        }
    }

    // Quoting is done per cell, so the writer must not add its own.
    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    wtr.write_record(fields.iter().map(|f| quote(f)))?;
    for record in records {
        wtr.write_record(
            fields
                .iter()
                .map(|f| record.get(f).map(quote).unwrap_or_default()),
        )?;
    }

    let mut data = wtr
        .into_inner()
        .map_err(|e| RecordError::Encode(e.to_string()))?;
    if data.last() == Some(&b'\n') {
        data.pop();
    }
    String::from_utf8(data).map_err(|e| RecordError::Encode(e.to_string()))
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Maps header cells onto unique column slots.
struct HeaderLayout {
    columns: Arc<[String]>,
    slots: Vec<usize>,
}

impl HeaderLayout {
    fn from_header(header: &StringRecord) -> Self {
        let mut columns: Vec<String> = Vec::with_capacity(header.len());
        let mut slots = Vec::with_capacity(header.len());
        for name in header.iter() {
            let slot = match columns.iter().position(|c| c == name) {
                Some(existing) => existing,
                None => {
                    columns.push(name.to_string());
                    columns.len() - 1
                }
            };
            slots.push(slot);
        }
        Self {
            columns: columns.into(),
            slots,
        }
    }

    fn record(&self, row: &StringRecord) -> Record {
        if row.len() > self.slots.len() {
            return self.overflow_record(row);
        }

        let width = self.slots[..row.len()]
            .iter()
            .max()
            .map_or(0, |slot| slot + 1);
        let mut values = vec![String::new(); width];
        for (slot, value) in self.slots.iter().zip(row.iter()) {
            values[*slot] = value.to_string();
        }
        Record::new(Arc::clone(&self.columns), values)
    }

    // Cells beyond the header are keyed by their position.
    fn overflow_record(&self, row: &StringRecord) -> Record {
        let mut columns = self.columns.to_vec();
        let mut values = vec![String::new(); columns.len()];
        for (idx, value) in row.iter().enumerate() {
            match self.slots.get(idx) {
                Some(slot) => values[*slot] = value.to_string(),
                None => {
                    columns.push(format!("_{}", idx));
                    values.push(value.to_string());
                }
            }
        }
        Record::new(columns.into(), values)
    }
}
