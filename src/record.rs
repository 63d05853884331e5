//! Source dataset - the records under review
//!
//! Each record is a question, the model's answer and the gold answer. The
//! dataset has no key column; a record is identified by its 0-based position.

use crate::table::Table;
use crate::{Error, Result};
use serde::Serialize;
use std::path::Path;

pub const QUESTION: &str = "Question";
pub const ANSWER: &str = "Answer";
pub const GOLD_ANSWER: &str = "Gold Answer";

/// Columns every source file must carry
pub const REQUIRED_COLUMNS: &[&str] = &[QUESTION, ANSWER, GOLD_ANSWER];

/// One question / model-answer / gold-answer triple
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRecord {
    pub question: String,
    pub model_answer: String,
    pub gold_answer: String,
}

/// The loaded source dataset.
///
/// The raw table is kept alongside the typed records so a fresh annotation
/// file can start as a full copy of the source, extra columns included.
#[derive(Debug, Clone)]
pub struct SourceTable {
    table: Table,
    records: Vec<SourceRecord>,
}

impl SourceTable {
    /// Validate a parsed table and extract its records
    pub fn from_table(table: Table, path: &Path) -> Result<Self> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !table.has_column(c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Schema {
                path: path.to_path_buf(),
                missing,
            });
        }

        if table.is_empty() {
            return Err(Error::Load(format!("{} contains no records", path.display())));
        }

        let records = (0..table.len())
            .map(|i| SourceRecord {
                question: table.get_or_empty(i, QUESTION).to_string(),
                model_answer: table.get_or_empty(i, ANSWER).to_string(),
                gold_answer: table.get_or_empty(i, GOLD_ANSWER).to_string(),
            })
            .collect();

        Ok(Self { table, records })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&SourceRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Load and validate the source dataset.
///
/// Fails with `NotFound` if the file is missing, `Schema` if a required column
/// is absent and `Load` for anything else. None of these are recoverable.
pub fn load_source(path: &Path) -> Result<SourceTable> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let table = Table::read_csv_path(path).map_err(|e| match e {
        Error::Load(msg) => Error::Load(msg),
        other => Error::Load(other.to_string()),
    })?;

    let source = SourceTable::from_table(table, path)?;
    tracing::debug!("Loaded {} source records from {}", source.len(), path.display());
    Ok(source)
}
