//! Export of the annotation table as a timestamped CSV artifact

use crate::clock::ReviewClock;
use crate::storage::AnnotationStore;
use crate::storage::csv_store::write_atomic;
use crate::Result;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// File name prefix of exported artifacts
pub const EXPORT_PREFIX: &str = "qa_review_";

/// Export file name for an instant, e.g. `qa_review_20261017_150507.csv`
pub fn export_file_name(clock: &ReviewClock, at: DateTime<Utc>) -> String {
    format!("{}{}.csv", EXPORT_PREFIX, clock.export_suffix_at(at))
}

/// Re-read the store and write it to `dir` under a timestamped name.
///
/// Returns `None` when nothing has been saved yet.
pub fn export_to_dir<S: AnnotationStore + ?Sized>(
    store: &S,
    dir: &Path,
    clock: &ReviewClock,
) -> Result<Option<PathBuf>> {
    export_at(store, dir, clock, Utc::now())
}

pub fn export_at<S: AnnotationStore + ?Sized>(
    store: &S,
    dir: &Path,
    clock: &ReviewClock,
    at: DateTime<Utc>,
) -> Result<Option<PathBuf>> {
    let Some(table) = store.export_table()? else {
        return Ok(None);
    };

    let path = dir.join(export_file_name(clock, at));
    write_atomic(&path, &table)?;
    tracing::info!("Exported {} rows to {}", table.len(), path.display());
    Ok(Some(path))
}
