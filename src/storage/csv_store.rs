//! CSV-backed annotation store
//!
//! The annotation file is the canonical record: the source columns followed
//! by the six annotation columns, one row per source record. Every save is a
//! full read-modify-write of that file, finished by renaming a temp file over
//! it so readers never see a half-written table.

use super::{AnnotationStore, fresh_annotation_table, reconcile};
use crate::annotation::{AnnotationPatch, SavePolicy};
use crate::record::SourceTable;
use crate::table::Table;
use crate::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Annotation store backed by a single CSV file
pub struct CsvStore {
    path: PathBuf,
    source: SourceTable,
    policy: SavePolicy,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>, source: SourceTable, policy: SavePolicy) -> Self {
        Self {
            path: path.into(),
            source,
            policy,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the annotation file strictly: a missing file is `None`, a broken one is an error
    pub fn read_existing(&self) -> Result<Option<Table>> {
        if !self.path.exists() {
            return Ok(None);
        }
        Table::read_csv_path(&self.path).map(Some)
    }

    /// The table a save would start from: on-disk data reconciled, or a fresh copy of the source.
    ///
    /// An existing file that cannot be parsed is a `Save` error here, never a
    /// fresh start.
    fn reconciled_table(&self) -> Result<Table> {
        let mut table = match self.read_existing() {
            Ok(Some(table)) => table,
            Ok(None) => {
                tracing::info!("Starting new annotation file at {}", self.path.display());
                fresh_annotation_table(&self.source)
            }
            Err(e) => return Err(Error::save(&self.path, e)),
        };
        reconcile(&mut table, self.source.len());
        Ok(table)
    }
}

impl AnnotationStore for CsvStore {
    fn source(&self) -> &SourceTable {
        &self.source
    }

    fn policy(&self) -> &SavePolicy {
        &self.policy
    }

    fn location(&self) -> &Path {
        &self.path
    }

    fn load_annotations(&self) -> Option<Table> {
        match self.read_existing() {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable annotation file {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    fn write_row(&mut self, index: usize, patch: &AnnotationPatch, reviewer: &str, reviewer_type: &str) -> Result<()> {
        let mut table = self.reconciled_table()?;
        patch.apply_to(&mut table, index, reviewer, reviewer_type);
        write_atomic(&self.path, &table)
    }

    fn export_table(&self) -> Result<Option<Table>> {
        self.read_existing()
    }
}

/// Write `table` to `path` through a temp file in the same directory.
///
/// The replaced file keeps its permissions. A new file is made readable by
/// everyone who can read the directory, like a plain `File::create` would be.
pub fn write_atomic(path: &Path, table: &Table) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }

    let bytes = table.to_csv_bytes()?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(&bytes)?;
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => tmp.as_file().set_permissions(meta.permissions())?,
        _ => set_new_file_permissions(tmp.as_file())?,
    }
    tmp.as_file().sync_all()?;
    // On failure the temp file is dropped with the error, which deletes it
    tmp.persist(path).map_err(|e| Error::save(path, Error::Io(e.error)))?;
    Ok(())
}

#[cfg(unix)]
fn set_new_file_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_new_file_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{AnnotationRow, ReviewerIdentity};
    use crate::rating::{Rating, ReviewerType};
    use crate::record::load_source;
    use crate::storage::SaveOutcome;
    use crate::storage::schema::{ANNOTATION_COLUMNS, RATING, RATING_VALUE, REMARKS, REVIEWER_TYPE};
    use crate::stats::compute_progress;
    use tempfile::{TempDir, tempdir};

    const SOURCE: &str = "Question,Answer,Gold Answer\n\
        What is VAT?,A tax on goods,A consumption tax on value added\n\
        Who files returns?,Everyone,Individuals above the threshold\n\
        When is the deadline?,June,30 November\n";

    fn setup(source: &str) -> (TempDir, CsvStore) {
        let dir = tempdir().unwrap();
        let source_path = dir.path().join("qa.csv");
        std::fs::write(&source_path, source).unwrap();
        let source = load_source(&source_path).unwrap();
        let store = CsvStore::new(dir.path().join("reviews.csv"), source, SavePolicy::default());
        (dir, store)
    }

    fn patch() -> AnnotationPatch {
        AnnotationPatch::new(
            ReviewerIdentity::new("Nusrat", Some(ReviewerType::TaxOfficer)),
            "2026-10-17 03:15:00 PM",
        )
    }

    #[test]
    fn test_first_save_creates_full_file() {
        let (_dir, mut store) = setup(SOURCE);
        assert!(store.load_annotations().is_none());

        let outcome = store.save_row(0, &patch().with_rating(Some(Rating::Excellent))).unwrap();
        assert_eq!(outcome, SaveOutcome::Saved);

        let table = store.load_annotations().unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0, RATING), Some("⭐⭐⭐⭐⭐ Excellent"));
        assert_eq!(table.get(0, RATING_VALUE), Some("5"));
        assert_eq!(table.get(0, "Question"), Some("What is VAT?"));
        for row in 1..3 {
            assert!(AnnotationRow::from_table(&table, row).is_blank());
        }
    }

    #[test]
    fn test_rating_value_follows_mapping_for_every_row() {
        let (_dir, mut store) = setup(SOURCE);
        let ratings = [Rating::VeryPoor, Rating::Good, Rating::Fair];
        for (i, rating) in ratings.iter().enumerate() {
            store.save_row(i, &patch().with_rating(Some(*rating))).unwrap();
        }

        let table = store.load_annotations().unwrap();
        for (i, rating) in ratings.iter().enumerate() {
            assert_eq!(table.get(i, RATING_VALUE), Some(rating.value().to_string().as_str()));
        }
    }

    #[test]
    fn test_empty_inputs_do_not_erase_earlier_values() {
        let (_dir, mut store) = setup(SOURCE);
        store
            .save_row(1, &patch().with_rating(Some(Rating::Poor)).with_remark(Some("threshold is wrong".into())))
            .unwrap();
        store.save_row(1, &patch().with_remark(Some(String::new()))).unwrap();

        let row = store.annotation(1);
        assert_eq!(row.remark, "threshold is wrong");
        assert_eq!(row.rating_value, "2");
    }

    #[test]
    fn test_progress_counts_single_rating() {
        let (_dir, mut store) = setup(SOURCE);
        store.save_row(2, &patch().with_rating(Some(Rating::Good))).unwrap();

        let table = store.load_annotations().unwrap();
        let progress = compute_progress(&table, store.source().len());
        assert_eq!(progress.reviewed, 1);
        assert_eq!(progress.total, 3);
    }

    #[test]
    fn test_legacy_short_file_is_migrated_and_padded() {
        let (dir, mut store) = setup(SOURCE);
        std::fs::write(
            dir.path().join("reviews.csv"),
            "Question,Answer,Gold Answer,Rating,Rating_Value,Remarks,Reviewer,Review_Date\n\
             What is VAT?,A tax on goods,A consumption tax on value added,⭐⭐⭐ Fair,3,\"close, but vague\",Karim,2025-01-02 10:00:00 AM\n\
             Who files returns?,Everyone,Individuals above the threshold,,,,,\n",
        )
        .unwrap();

        store.save_row(2, &patch().with_remark(Some("deadline is 30 November".into()))).unwrap();

        let table = store.load_annotations().unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.has_column(REVIEWER_TYPE));
        assert_eq!(table.get(0, REVIEWER_TYPE), Some(""));
        assert_eq!(table.get(1, REVIEWER_TYPE), Some(""));
        assert_eq!(table.get(2, REVIEWER_TYPE), Some("Tax Officer"));
        assert_eq!(table.get(0, REMARKS), Some("close, but vague"));
        assert_eq!(table.get(2, REMARKS), Some("deadline is 30 November"));
    }

    #[test]
    fn test_longer_file_is_never_truncated() {
        let (dir, mut store) = setup(SOURCE);
        let mut existing = fresh_annotation_table(store.source());
        existing.pad_rows(5);
        existing.set(4, REMARKS, "row from an older, longer dataset");
        write_atomic(&dir.path().join("reviews.csv"), &existing).unwrap();

        store.save_row(0, &patch().with_rating(Some(Rating::Good))).unwrap();

        let exported = store.export_table().unwrap().unwrap();
        assert_eq!(exported.len(), 5);
        assert_eq!(exported.get(4, REMARKS), Some("row from an older, longer dataset"));
        for column in ANNOTATION_COLUMNS {
            assert!(exported.has_column(column));
        }
    }

    #[test]
    fn test_unreadable_file_is_kept_and_save_fails() {
        let (dir, mut store) = setup(SOURCE);
        let path = dir.path().join("reviews.csv");
        // One Latin-1 byte in an earlier remark, as a spreadsheet export might leave it
        let mut bytes = b"Question,Answer,Gold Answer,Rating,Rating_Value,Remarks,Reviewer,Reviewer_Type,Review_Date\n\
            What is VAT?,A tax on goods,A consumption tax on value added,".to_vec();
        bytes.extend_from_slice("⭐⭐ Poor,2,caf".as_bytes());
        bytes.push(0xE9);
        bytes.extend_from_slice(b",Karim,Tax Payer,then\n");
        std::fs::write(&path, &bytes).unwrap();

        assert!(store.load_annotations().is_none());
        assert!(store.export_table().is_err());

        let err = store.save_row(1, &patch().with_rating(Some(Rating::Good))).unwrap_err();
        assert!(matches!(err, Error::Save { .. }));
        assert!(err.is_recoverable());
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }

    #[test]
    fn test_ragged_file_is_not_replaced() {
        let (dir, mut store) = setup(SOURCE);
        let path = dir.path().join("reviews.csv");
        std::fs::write(&path, "a,b\n1,2,3,4\n").unwrap();

        assert!(store.save_row(0, &patch().with_rating(Some(Rating::Fair))).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a,b\n1,2,3,4\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_save_keeps_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, mut store) = setup(SOURCE);
        let path = dir.path().join("reviews.csv");
        store.save_row(0, &patch().with_rating(Some(Rating::Good))).unwrap();
        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&path), 0o644);

        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o664)).unwrap();
        store.save_row(1, &patch().with_remark(Some("shared".into()))).unwrap();
        assert_eq!(mode(&path), 0o664);
    }

    #[test]
    fn test_identity_failure_writes_nothing() {
        let (_dir, mut store) = setup(SOURCE);
        let anonymous = AnnotationPatch::new(ReviewerIdentity::default(), "now").with_rating(Some(Rating::Good));

        let err = store.save_row(0, &anonymous).unwrap_err();
        assert!(matches!(err, Error::IdentityMissing));
        assert!(!store.path().exists());
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let (_dir, mut store) = setup(SOURCE);
        let err = store.save_row(3, &patch()).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange { index: 3, len: 3 }));
    }

    #[test]
    fn test_unwritable_location_is_save_error() {
        let (dir, _) = setup(SOURCE);
        let source = load_source(&dir.path().join("qa.csv")).unwrap();
        // A directory where the file should be makes the rename fail
        let blocked = dir.path().join("blocked.csv");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("keep"), "x").unwrap();
        let mut store = CsvStore::new(&blocked, source, SavePolicy::default());

        let err = store.save_row(0, &patch().with_rating(Some(Rating::Good))).unwrap_err();
        assert!(matches!(err, Error::Save { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_failed_rename_leaves_no_temp_file() {
        let (dir, store) = setup(SOURCE);
        let blocked = dir.path().join("blocked.csv");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("keep"), "x").unwrap();

        let table = fresh_annotation_table(store.source());
        let err = write_atomic(&blocked, &table).unwrap_err();
        assert!(matches!(err, Error::Save { .. }));

        let mut names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["blocked.csv".to_string(), "qa.csv".to_string()]);
    }

    #[test]
    fn test_source_bom_does_not_reach_saved_header() {
        let (dir, mut store) = setup(&format!("\u{feff}{}", SOURCE));
        assert_eq!(store.source().table().headers()[0], "Question");

        store.save_row(0, &patch().with_rating(Some(Rating::Good))).unwrap();

        let saved = std::fs::read(dir.path().join("reviews.csv")).unwrap();
        assert!(saved.starts_with(b"Question,Answer,Gold Answer,"));
        let table = store.load_annotations().unwrap();
        assert_eq!(table.get(0, "Question"), Some("What is VAT?"));
    }

    #[test]
    fn test_extra_columns_survive_saves() {
        let (_dir, mut store) = setup(
            "Question,Answer,Gold Answer,Topic\nq1,a1,g1,vat\nq2,a2,g2,income\n",
        );
        store.save_row(1, &patch().with_remark(Some("fine".into()))).unwrap();
        store.save_row(0, &patch().with_rating(Some(Rating::Good))).unwrap();

        let table = store.load_annotations().unwrap();
        assert_eq!(table.get(1, "Topic"), Some("income"));
        assert_eq!(table.get(1, REMARKS), Some("fine"));
        assert_eq!(table.headers()[3], "Topic");
    }
}
