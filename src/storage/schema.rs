//! Annotation schema definitions and migrations
//!
//! The annotation file has grown over releases:
//! - V1: `Rating`, `Remarks`
//! - V2: `Rating_Value`, `Reviewer`, `Review_Date`
//! - V3: `Reviewer_Type`
//!
//! A CSV file carries no version marker, so its version is inferred from the
//! header. The SQLite store records it in `PRAGMA user_version`.

use crate::table::Table;

pub const RATING: &str = "Rating";
pub const RATING_VALUE: &str = "Rating_Value";
pub const REMARKS: &str = "Remarks";
pub const REVIEWER: &str = "Reviewer";
pub const REVIEWER_TYPE: &str = "Reviewer_Type";
pub const REVIEW_DATE: &str = "Review_Date";

/// The six reviewer-added columns, in the order a fresh file gets them
pub const ANNOTATION_COLUMNS: &[&str] = &[
    RATING,
    RATING_VALUE,
    REMARKS,
    REVIEWER,
    REVIEWER_TYPE,
    REVIEW_DATE,
];

/// Version of the annotation columns present in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SchemaVersion {
    /// Source columns only
    Source,
    V1,
    V2,
    V3,
}

impl SchemaVersion {
    pub const CURRENT: SchemaVersion = SchemaVersion::V3;

    pub fn number(&self) -> u32 {
        match self {
            SchemaVersion::Source => 0,
            SchemaVersion::V1 => 1,
            SchemaVersion::V2 => 2,
            SchemaVersion::V3 => 3,
        }
    }

    pub fn from_number(n: u32) -> Option<Self> {
        match n {
            0 => Some(SchemaVersion::Source),
            1 => Some(SchemaVersion::V1),
            2 => Some(SchemaVersion::V2),
            3 => Some(SchemaVersion::V3),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    /// Columns introduced by this version
    pub fn added_columns(&self) -> &'static [&'static str] {
        match self {
            SchemaVersion::Source => &[],
            SchemaVersion::V1 => &[RATING, REMARKS],
            SchemaVersion::V2 => &[RATING_VALUE, REVIEWER, REVIEW_DATE],
            SchemaVersion::V3 => &[REVIEWER_TYPE],
        }
    }

    /// Highest version whose columns, and all earlier versions' columns, are present
    pub fn detect(table: &Table) -> Self {
        let mut version = SchemaVersion::Source;
        while let Some(next) = version.next() {
            if !next.added_columns().iter().all(|c| table.has_column(c)) {
                break;
            }
            version = next;
        }
        version
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaVersion::Source => write!(f, "source"),
            other => write!(f, "v{}", other.number()),
        }
    }
}

/// What `migrate` changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub from: SchemaVersion,
    pub to: SchemaVersion,
    pub added_columns: Vec<String>,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.added_columns.is_empty()
    }
}

fn migrate_to_v1(table: &mut Table) -> Vec<String> {
    add_columns(table, SchemaVersion::V1.added_columns())
}

fn migrate_to_v2(table: &mut Table) -> Vec<String> {
    add_columns(table, SchemaVersion::V2.added_columns())
}

fn migrate_to_v3(table: &mut Table) -> Vec<String> {
    add_columns(table, SchemaVersion::V3.added_columns())
}

fn add_columns(table: &mut Table, columns: &[&str]) -> Vec<String> {
    columns
        .iter()
        .filter(|c| table.add_column(c))
        .map(|c| c.to_string())
        .collect()
}

/// Bring a table up to `SchemaVersion::CURRENT`.
///
/// Each step only adds columns that are missing, so a header holding an
/// irregular subset (say V3's column without V2's) still ends up complete.
/// Existing columns, known or not, keep their position and contents.
pub fn migrate(table: &mut Table) -> MigrationReport {
    let from = SchemaVersion::detect(table);
    let mut added = Vec::new();
    let mut version = SchemaVersion::Source;

    while let Some(next) = version.next() {
        let step: fn(&mut Table) -> Vec<String> = match next {
            SchemaVersion::Source => unreachable!("Source is never a migration target"),
            SchemaVersion::V1 => migrate_to_v1,
            SchemaVersion::V2 => migrate_to_v2,
            SchemaVersion::V3 => migrate_to_v3,
        };
        added.extend(step(table));
        version = next;
    }

    MigrationReport {
        from,
        to: SchemaVersion::CURRENT,
        added_columns: added,
    }
}

// ========== SQLite schema ==========

/// SQL to create the annotations table at V1
pub const CREATE_ANNOTATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS annotations (
    row_index INTEGER PRIMARY KEY,
    rating TEXT NOT NULL DEFAULT '',
    remarks TEXT NOT NULL DEFAULT ''
)
"#;

/// SQL to create the source mirror, used to rebuild the full table on export
pub const CREATE_SOURCE_COLUMNS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS source_columns (
    position INTEGER PRIMARY KEY,
    name TEXT NOT NULL
)
"#;

pub const CREATE_SOURCE_CELLS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS source_cells (
    row_index INTEGER NOT NULL,
    position INTEGER NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (row_index, position)
)
"#;

/// Statements for each SQLite schema step, indexed by target version
pub fn sqlite_migration(target: SchemaVersion) -> &'static [&'static str] {
    match target {
        SchemaVersion::Source => &[],
        SchemaVersion::V1 => &[
            CREATE_ANNOTATIONS_TABLE,
            CREATE_SOURCE_COLUMNS_TABLE,
            CREATE_SOURCE_CELLS_TABLE,
        ],
        SchemaVersion::V2 => &[
            "ALTER TABLE annotations ADD COLUMN rating_value TEXT NOT NULL DEFAULT ''",
            "ALTER TABLE annotations ADD COLUMN reviewer TEXT NOT NULL DEFAULT ''",
            "ALTER TABLE annotations ADD COLUMN review_date TEXT NOT NULL DEFAULT ''",
        ],
        SchemaVersion::V3 => &[
            "ALTER TABLE annotations ADD COLUMN reviewer_type TEXT NOT NULL DEFAULT ''",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(headers: &[&str]) -> Table {
        Table::new(headers.iter().map(|h| h.to_string()).collect())
    }

    #[test]
    fn test_detect_versions() {
        assert_eq!(SchemaVersion::detect(&table_with(&["Question"])), SchemaVersion::Source);
        assert_eq!(
            SchemaVersion::detect(&table_with(&["Question", RATING, REMARKS])),
            SchemaVersion::V1
        );
        assert_eq!(
            SchemaVersion::detect(&table_with(&[RATING, RATING_VALUE, REMARKS, REVIEWER, REVIEW_DATE])),
            SchemaVersion::V2
        );
        assert_eq!(SchemaVersion::detect(&table_with(ANNOTATION_COLUMNS)), SchemaVersion::V3);
        // V3 column present without V2's does not count as V3
        assert_eq!(
            SchemaVersion::detect(&table_with(&[RATING, REMARKS, REVIEWER_TYPE])),
            SchemaVersion::V1
        );
    }

    #[test]
    fn test_migrate_legacy_v2() {
        let mut table = table_with(&["Question", "Answer", "Gold Answer", RATING, RATING_VALUE, REMARKS, REVIEWER, REVIEW_DATE]);
        table.pad_rows(2);

        let report = migrate(&mut table);
        assert_eq!(report.from, SchemaVersion::V2);
        assert_eq!(report.to, SchemaVersion::V3);
        assert_eq!(report.added_columns, vec![REVIEWER_TYPE.to_string()]);
        assert_eq!(table.headers().last().map(String::as_str), Some(REVIEWER_TYPE));
        assert_eq!(table.get(1, REVIEWER_TYPE), Some(""));
    }

    #[test]
    fn test_migrate_irregular_subset_keeps_order() {
        let mut table = table_with(&["Notes", REVIEWER_TYPE, RATING]);
        let report = migrate(&mut table);

        assert_eq!(report.from, SchemaVersion::Source);
        for column in ANNOTATION_COLUMNS {
            assert!(table.has_column(column), "missing {column}");
        }
        assert_eq!(&table.headers()[..3], &["Notes", REVIEWER_TYPE, RATING]);

        let again = migrate(&mut table);
        assert!(again.is_noop());
        assert_eq!(again.from, SchemaVersion::V3);
    }

    #[test]
    fn test_sqlite_steps_cover_every_version() {
        let mut version = SchemaVersion::Source;
        while let Some(next) = version.next() {
            assert!(!sqlite_migration(next).is_empty(), "no SQL for {next}");
            version = next;
        }
        assert_eq!(version, SchemaVersion::CURRENT);
    }
}
