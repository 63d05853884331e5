//! # QA Review - annotation store for question/answer review sessions
//!
//! A reviewer walks a dataset of questions, model answers and gold answers,
//! one record at a time, and attaches a star rating and a free-text remark.
//!
//! QA Review provides:
//! - Source loading with required-column checks
//! - A row-indexed annotation table with non-destructive merge on save
//! - Versioned schema migration for annotation files written by older releases
//! - CSV (canonical, read-modify-write) and SQLite (indexed) stores
//! - Progress and rating statistics
//! - An explicit session cursor for terminal review sessions

pub mod record;
pub mod rating;
pub mod annotation;
pub mod table;
pub mod storage;
pub mod stats;
pub mod clock;
pub mod export;
pub mod session;
pub mod config;
pub mod output;
pub mod ui;

use std::path::PathBuf;

// Re-exports for convenient access
pub use record::{SourceRecord, SourceTable, load_source};
pub use rating::{Rating, ReviewerType};
pub use annotation::{AnnotationPatch, AnnotationRow, ReviewerIdentity, SavePolicy};
pub use table::Table;
pub use storage::{AnnotationStore, CsvStore, SaveOutcome, SqliteStore};
pub use stats::{Progress, Statistics, compute_progress, compute_statistics};
pub use clock::ReviewClock;
pub use session::{Navigation, Session, SessionCursor};

/// Result type alias for QA Review operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for QA Review operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Missing columns in {}: {}", path.display(), missing.join(", "))]
    Schema { path: PathBuf, missing: Vec<String> },

    #[error("Error loading data: {0}")]
    Load(String),

    #[error("Error saving review to {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Please enter your name and select a reviewer type before saving")]
    IdentityMissing,

    #[error("Row {index} is out of range (dataset has {len} rows)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid rating: {0}")]
    InvalidRating(String),

    #[error("Invalid reviewer type: {0}")]
    InvalidReviewerType(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a lower-level failure as a save error for `path`
    pub fn save(path: impl Into<PathBuf>, source: Error) -> Self {
        Error::Save {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Whether the session can carry on after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Error::NotFound(_) | Error::Schema { .. } | Error::Load(_) | Error::Config(_)
        )
    }
}
