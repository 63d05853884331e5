//! SQLite storage implementation
//!
//! One `annotations` row per record index, so a save touches one row instead
//! of rewriting the whole table. Source columns are mirrored into
//! `source_columns`/`source_cells` so export can rebuild the same CSV the
//! file store would hold.

use super::schema::{self, ANNOTATION_COLUMNS, SchemaVersion};
use super::AnnotationStore;
use crate::annotation::{AnnotationPatch, AnnotationRow, SavePolicy};
use crate::record::SourceTable;
use crate::table::Table;
use crate::{Error, Result};
use rusqlite::{Connection, params};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// SQLite-backed annotation store
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
    source: SourceTable,
    policy: SavePolicy,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path, source: SourceTable, policy: SavePolicy) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn, path.to_path_buf(), source, policy)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory(source: SourceTable, policy: SavePolicy) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, PathBuf::from(":memory:"), source, policy)
    }

    fn init(conn: Connection, path: PathBuf, source: SourceTable, policy: SavePolicy) -> Result<Self> {
        let mut store = Self {
            conn,
            path,
            source,
            policy,
        };
        store.migrate()?;
        store.mirror_source()?;
        Ok(store)
    }

    /// Current schema version recorded in the database
    pub fn schema_version(&self) -> Result<u32> {
        let version: u32 = self.conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version)
    }

    /// Run every pending migration step, one transaction per step
    fn migrate(&mut self) -> Result<()> {
        let found = self.schema_version()?;
        let mut version = SchemaVersion::from_number(found).ok_or_else(|| {
            Error::Load(format!(
                "annotation database schema v{} is newer than supported v{}",
                found,
                SchemaVersion::CURRENT.number()
            ))
        })?;

        while let Some(next) = version.next() {
            let tx = self.conn.transaction()?;
            for stmt in schema::sqlite_migration(next) {
                tx.execute_batch(stmt)?;
            }
            tx.execute_batch(&format!("PRAGMA user_version = {}", next.number()))?;
            tx.commit()?;
            tracing::debug!("Migrated annotation database to {}", next);
            version = next;
        }
        Ok(())
    }

    /// Record source columns not seen before and any source cells not yet stored
    fn mirror_source(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        let mut positions = column_positions(&tx)?;
        let first_open = positions.is_empty();
        let mut next_position = positions.values().copied().max().map_or(0, |p| p + 1);
        for name in self.source.table().headers() {
            if positions.contains_key(name) {
                continue;
            }
            tx.execute(
                "INSERT INTO source_columns (position, name) VALUES (?1, ?2)",
                params![next_position, name],
            )?;
            if !first_open {
                tracing::info!("Source column '{}' added to {}", name, self.path.display());
            }
            positions.insert(name.clone(), next_position);
            next_position += 1;
        }

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO source_cells (row_index, position, value) VALUES (?1, ?2, ?3)",
            )?;
            let table = self.source.table();
            for (name, position) in &positions {
                let Some(col) = table.column_index(name) else {
                    continue;
                };
                for (row_index, row) in table.rows().iter().enumerate() {
                    stmt.execute(params![row_index as i64, *position, row[col]])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Number of rows that have ever been saved
    pub fn count_annotations(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row("SELECT COUNT(*) FROM annotations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Load a CSV annotation table (e.g. an existing reviews file) into the database.
    ///
    /// Imported rows replace whatever the database held for the same index.
    /// Columns other than the annotation columns are added to the source mirror.
    pub fn import_table(&mut self, table: &Table) -> Result<usize> {
        let tx = self.conn.transaction()?;

        let mut positions = column_positions(&tx)?;
        let mut next_position = positions.values().copied().max().map_or(0, |p| p + 1);
        for header in table.headers() {
            if ANNOTATION_COLUMNS.contains(&header.as_str()) || positions.contains_key(header) {
                continue;
            }
            tx.execute(
                "INSERT INTO source_columns (position, name) VALUES (?1, ?2)",
                params![next_position, header],
            )?;
            positions.insert(header.clone(), next_position);
            next_position += 1;
        }

        {
            let mut cell = tx.prepare(
                "INSERT OR REPLACE INTO source_cells (row_index, position, value) VALUES (?1, ?2, ?3)",
            )?;
            let mut annotation = tx.prepare(
                r#"
                INSERT OR REPLACE INTO annotations
                    (row_index, rating, rating_value, remarks, reviewer, reviewer_type, review_date)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;

            for index in 0..table.len() {
                for (name, position) in &positions {
                    if let Some(value) = table.get(index, name) {
                        cell.execute(params![index as i64, *position, value])?;
                    }
                }

                let row = AnnotationRow::from_table(table, index);
                if row.is_blank() {
                    continue;
                }
                annotation.execute(params![
                    index as i64,
                    row.rating,
                    row.rating_value,
                    row.remark,
                    row.reviewer_name,
                    row.reviewer_type,
                    row.reviewed_at,
                ])?;
            }
        }

        tx.commit()?;
        tracing::info!("Imported {} rows into {}", table.len(), self.path.display());
        Ok(table.len())
    }

    /// Rebuild the full annotation table: mirrored source columns then annotation columns
    fn build_table(&self) -> Result<Table> {
        let mut stmt = self.conn.prepare("SELECT position, name FROM source_columns ORDER BY position")?;
        let columns: Vec<(i64, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;

        let mut headers: Vec<String> = columns.iter().map(|(_, name)| name.clone()).collect();
        headers.extend(ANNOTATION_COLUMNS.iter().map(|c| c.to_string()));
        let offsets: HashMap<i64, usize> = columns
            .iter()
            .enumerate()
            .map(|(offset, (position, _))| (*position, offset))
            .collect();

        let max_row: Option<i64> = self.conn.query_row(
            "SELECT MAX(r) FROM (SELECT MAX(row_index) AS r FROM annotations UNION ALL SELECT MAX(row_index) FROM source_cells)",
            [],
            |row| row.get(0),
        )?;
        let stored_rows = max_row.map_or(0, |r| r as usize + 1);

        let mut table = Table::new(headers);
        table.pad_rows(stored_rows.max(self.source.len()));

        let mut cells = self.conn.prepare("SELECT row_index, position, value FROM source_cells")?;
        let cell_rows = cells.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?))
        })?;
        for cell in cell_rows {
            let (row_index, position, value) = cell?;
            if let Some(offset) = offsets.get(&position) {
                let header = table.headers()[*offset].clone();
                table.set(row_index as usize, &header, value);
            }
        }

        let mut annotations = self.conn.prepare(
            "SELECT row_index, rating, rating_value, remarks, reviewer, reviewer_type, review_date FROM annotations",
        )?;
        let rows = annotations.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                AnnotationRow {
                    rating: row.get(1)?,
                    rating_value: row.get(2)?,
                    remark: row.get(3)?,
                    reviewer_name: row.get(4)?,
                    reviewer_type: row.get(5)?,
                    reviewed_at: row.get(6)?,
                },
            ))
        })?;
        for entry in rows {
            let (row_index, row) = entry?;
            let index = row_index as usize;
            table.set(index, schema::RATING, row.rating);
            table.set(index, schema::RATING_VALUE, row.rating_value);
            table.set(index, schema::REMARKS, row.remark);
            table.set(index, schema::REVIEWER, row.reviewer_name);
            table.set(index, schema::REVIEWER_TYPE, row.reviewer_type);
            table.set(index, schema::REVIEW_DATE, row.reviewed_at);
        }

        Ok(table)
    }
}

fn column_positions(conn: &Connection) -> Result<HashMap<String, i64>> {
    let mut stmt = conn.prepare("SELECT name, position FROM source_columns")?;
    let positions = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;
    Ok(positions)
}

impl AnnotationStore for SqliteStore {
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
        let loaded = self
            .count_annotations()
            .and_then(|count| if count == 0 { Ok(None) } else { self.build_table().map(Some) });
        match loaded {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!("Ignoring unreadable annotation database {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn write_row(&mut self, index: usize, patch: &AnnotationPatch, reviewer: &str, reviewer_type: &str) -> Result<()> {
        let (rating, rating_value) = match patch.rating {
            Some(rating) => (rating.label().to_string(), rating.value().to_string()),
            None => (String::new(), String::new()),
        };
        let remark = patch.remark_text().unwrap_or("");

        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO annotations (row_index, rating, rating_value, remarks, reviewer, reviewer_type, review_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(row_index) DO UPDATE SET
                rating = CASE WHEN excluded.rating <> '' THEN excluded.rating ELSE annotations.rating END,
                rating_value = CASE WHEN excluded.rating <> '' THEN excluded.rating_value ELSE annotations.rating_value END,
                remarks = CASE WHEN excluded.remarks <> '' THEN excluded.remarks ELSE annotations.remarks END,
                reviewer = excluded.reviewer,
                reviewer_type = excluded.reviewer_type,
                review_date = excluded.review_date
            "#,
            params![
                index as i64,
                rating,
                rating_value,
                remark,
                reviewer,
                reviewer_type,
                patch.timestamp,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn export_table(&self) -> Result<Option<Table>> {
        if self.count_annotations()? == 0 {
            return Ok(None);
        }
        self.build_table().map(Some)
    }
}
