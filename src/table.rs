//! Header + string-cell table
//!
//! Both the source dataset and the annotation file are plain CSV. Every cell
//! is kept as text so that columns this crate does not know about survive a
//! read-modify-write cycle untouched.

use crate::{Error, Result};
use std::io::{Read, Write};
use std::path::Path;

/// A rectangular table of text cells with a header row.
///
/// Rows are always exactly as wide as the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given header
    pub fn new(headers: Vec<String>) -> Self {
        Self { headers, rows: Vec::new() }
    }

    /// Build a table from a header and rows, padding or rejecting ragged rows
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let width = headers.len();
        let mut table = Self::new(headers);
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(Error::Load(format!(
                    "row {} has {} fields, expected {}",
                    i + 1,
                    row.len(),
                    width
                )));
            }
            row.resize(width, String::new());
            table.rows.push(row);
        }
        Ok(table)
    }

    /// Parse CSV text (header row first)
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Self::from_rows(headers, rows)
    }

    /// Read a CSV file from disk
    pub fn read_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::read_csv(std::io::BufReader::new(file))
    }

    /// Serialize as CSV, quoting cells that contain delimiters, quotes or newlines
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new().from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Serialize to an in-memory CSV buffer
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(buf)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by exact header name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Append a column filled with empty cells; no-op if it already exists
    pub fn add_column(&mut self, name: &str) -> bool {
        if self.has_column(name) {
            return false;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        true
    }

    /// Append blank rows until the table has at least `len` rows
    pub fn pad_rows(&mut self, len: usize) -> usize {
        let missing = len.saturating_sub(self.rows.len());
        let width = self.headers.len();
        for _ in 0..missing {
            self.rows.push(vec![String::new(); width]);
        }
        missing
    }

    /// Cell value, or `None` if the row or column does not exist
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// Cell value with missing rows/columns read as empty
    pub fn get_or_empty(&self, row: usize, column: &str) -> &str {
        self.get(row, column).unwrap_or("")
    }

    /// Overwrite a cell. Returns false if the row or column does not exist.
    pub fn set(&mut self, row: usize, column: &str, value: impl Into<String>) -> bool {
        let Some(col) = self.column_index(column) else {
            return false;
        };
        match self.rows.get_mut(row) {
            Some(r) => {
                r[col] = value.into();
                true
            }
            None => false,
        }
    }

    /// Iterate over one column's cells (empty iterator if absent)
    pub fn column(&self, name: &str) -> impl Iterator<Item = &str> {
        let col = self.column_index(name);
        self.rows
            .iter()
            .filter_map(move |r| col.map(|c| r[c].as_str()))
    }

    /// Append a row, padding it to the header width
    pub fn push_row(&mut self, mut row: Vec<String>) -> Result<()> {
        if row.len() > self.headers.len() {
            return Err(Error::Load(format!(
                "row has {} fields, expected {}",
                row.len(),
                self.headers.len()
            )));
        }
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
        Ok(())
    }
}
