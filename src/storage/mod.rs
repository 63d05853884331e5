//! Storage Layer - annotation persistence
//!
//! Two stores share one merge contract:
//! - `CsvStore`: the canonical annotation CSV, rewritten in full on each save
//! - `SqliteStore`: one row per record index, upserted in a transaction
//!
//! Both reconcile before writing: missing annotation columns are added and
//! the table is padded to the source length. Neither ever drops rows.

pub mod schema;
pub mod csv_store;
pub mod sqlite;

pub use csv_store::CsvStore;
pub use sqlite::SqliteStore;

use crate::annotation::{AnnotationPatch, AnnotationRow, SavePolicy};
use crate::record::SourceTable;
use crate::table::Table;
use crate::{Error, Result};
use std::path::Path;

/// Result of a save that passed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The row was merged and the store flushed
    Saved,
    /// Nothing to record under the current policy; no I/O happened
    Skipped,
}

/// A persistent annotation table keyed by source record index.
pub trait AnnotationStore {
    /// The source dataset this store annotates
    fn source(&self) -> &SourceTable;

    /// Save policy applied by `save_row`
    fn policy(&self) -> &SavePolicy;

    /// Where the data lives, for messages
    fn location(&self) -> &Path;

    /// Current annotation table, or `None` if nothing usable has been saved.
    ///
    /// Unreadable data degrades to `None`; it is never an error.
    fn load_annotations(&self) -> Option<Table>;

    /// Merge an already validated patch into row `index` and flush.
    ///
    /// Existing data that cannot be read fails the write and is left as it is.
    fn write_row(&mut self, index: usize, patch: &AnnotationPatch, reviewer: &str, reviewer_type: &str) -> Result<()>;

    /// Full annotation table for export, or `None` if nothing has been saved
    fn export_table(&self) -> Result<Option<Table>>;

    /// Validate and save a patch for row `index`.
    ///
    /// Index and identity problems are reported before any I/O. Write
    /// failures come back as `Error::Save`.
    fn save_row(&mut self, index: usize, patch: &AnnotationPatch) -> Result<SaveOutcome> {
        let len = self.source().len();
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }

        let Some((reviewer, reviewer_type)) = patch.resolve_identity(self.policy())? else {
            tracing::debug!("Skipping empty save for row {}", index);
            return Ok(SaveOutcome::Skipped);
        };

        self.write_row(index, patch, &reviewer, &reviewer_type)
            .map_err(|e| match e {
                e @ Error::Save { .. } => e,
                other => Error::save(self.location(), other),
            })?;

        tracing::debug!("Saved row {} to {}", index, self.location().display());
        Ok(SaveOutcome::Saved)
    }

    /// Saved annotation for one row (blank if none)
    fn annotation(&self, index: usize) -> AnnotationRow {
        self.load_annotations()
            .map(|table| AnnotationRow::from_table(&table, index))
            .unwrap_or_default()
    }
}

impl<T: AnnotationStore + ?Sized> AnnotationStore for Box<T> {
    fn source(&self) -> &SourceTable {
        (**self).source()
    }

    fn policy(&self) -> &SavePolicy {
        (**self).policy()
    }

    fn location(&self) -> &Path {
        (**self).location()
    }

    fn load_annotations(&self) -> Option<Table> {
        (**self).load_annotations()
    }

    fn write_row(&mut self, index: usize, patch: &AnnotationPatch, reviewer: &str, reviewer_type: &str) -> Result<()> {
        (**self).write_row(index, patch, reviewer, reviewer_type)
    }

    fn export_table(&self) -> Result<Option<Table>> {
        (**self).export_table()
    }
}

/// Clone the source table and give it blank annotation columns
pub fn fresh_annotation_table(source: &SourceTable) -> Table {
    let mut table = source.table().clone();
    for column in schema::ANNOTATION_COLUMNS {
        table.add_column(column);
    }
    table
}

/// Migrate and pad a loaded table so that any source index can be written
pub fn reconcile(table: &mut Table, source_len: usize) {
    let report = schema::migrate(table);
    if !report.is_noop() {
        tracing::info!(
            "Migrated annotation schema {} -> {} (added {})",
            report.from,
            report.to,
            report.added_columns.join(", ")
        );
    }

    let padded = table.pad_rows(source_len);
    if padded > 0 {
        tracing::debug!("Padded annotation table with {} blank rows", padded);
    }
}
