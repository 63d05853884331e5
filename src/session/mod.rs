//! Review session state
//!
//! A session walks the source records one at a time. It owns the store, the
//! cursor and whatever the reviewer has typed but not yet saved. Every
//! navigation first tries to save the pending edit at the current row, then
//! moves on whether or not that save worked.

pub mod command;

pub use command::ReviewCommand;

use crate::annotation::{AnnotationPatch, AnnotationRow, ReviewerIdentity};
use crate::clock::ReviewClock;
use crate::rating::{Rating, ReviewerType};
use crate::record::SourceRecord;
use crate::stats::{Progress, Statistics, compute_progress, compute_statistics};
use crate::storage::{AnnotationStore, SaveOutcome};
use crate::table::Table;
use crate::{Error, Result};

/// Cursor movement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Previous,
    Next,
    /// 0-based target, clamped into range
    JumpTo(usize),
    ResetToFirst,
}

impl Navigation {
    /// Index this move lands on from `current` in a dataset of `len` rows
    pub fn target(&self, current: usize, len: usize) -> usize {
        let last = len.saturating_sub(1);
        match self {
            Navigation::Previous => current.saturating_sub(1),
            Navigation::Next => (current + 1).min(last),
            Navigation::JumpTo(j) => (*j).min(last),
            Navigation::ResetToFirst => 0,
        }
    }
}

/// Position in the dataset plus a generation token.
///
/// The generation advances on every move; input collected under an older
/// generation is stale and must not be shown or saved again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionCursor {
    index: usize,
    generation: u64,
    len: usize,
}

impl SessionCursor {
    pub fn new(len: usize) -> Result<Self> {
        if len == 0 {
            return Err(Error::Load("cannot review an empty dataset".to_string()));
        }
        Ok(Self {
            index: 0,
            generation: 0,
            len,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.len
    }

    /// Advance the generation and move; returns the new index
    pub fn advance(&mut self, nav: Navigation) -> usize {
        self.generation += 1;
        self.index = nav.target(self.index, self.len);
        self.index
    }
}

/// Rating and remark typed for the current row but not yet saved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingEdit {
    pub rating: Option<Rating>,
    pub remark: Option<String>,
    generation: u64,
}

impl PendingEdit {
    fn for_generation(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.remark.is_none()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What a navigation did
#[derive(Debug)]
pub struct NavigationOutcome {
    pub from: usize,
    pub to: usize,
    /// Result of the save attempted before moving
    pub save: Result<SaveOutcome>,
}

/// One record as the reviewer sees it
#[derive(Debug, Clone)]
pub struct RowView<'a> {
    pub index: usize,
    pub total: usize,
    pub record: &'a SourceRecord,
    pub saved: AnnotationRow,
    pub pending: &'a PendingEdit,
}

impl RowView<'_> {
    pub fn is_reviewed(&self) -> bool {
        self.saved.is_reviewed()
    }
}

/// An interactive review session over one store
pub struct Session<S: AnnotationStore> {
    store: S,
    clock: ReviewClock,
    cursor: SessionCursor,
    reviewer: ReviewerIdentity,
    pending: PendingEdit,
    snapshot: Option<Table>,
}

impl<S: AnnotationStore> Session<S> {
    pub fn new(store: S, clock: ReviewClock) -> Result<Self> {
        let cursor = SessionCursor::new(store.source().len())?;
        let snapshot = store.load_annotations();
        Ok(Self {
            store,
            clock,
            cursor,
            reviewer: ReviewerIdentity::default(),
            pending: PendingEdit::for_generation(cursor.generation()),
            snapshot,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cursor(&self) -> &SessionCursor {
        &self.cursor
    }

    pub fn reviewer(&self) -> &ReviewerIdentity {
        &self.reviewer
    }

    pub fn pending(&self) -> &PendingEdit {
        &self.pending
    }

    pub fn clock(&self) -> &ReviewClock {
        &self.clock
    }

    /// Last annotation table read from the store
    pub fn annotations(&self) -> Option<&Table> {
        self.snapshot.as_ref()
    }

    pub fn set_reviewer_name(&mut self, name: impl Into<String>) {
        self.reviewer.name = name.into();
    }

    pub fn set_reviewer_type(&mut self, reviewer_type: Option<ReviewerType>) {
        self.reviewer.reviewer_type = reviewer_type;
    }

    pub fn set_rating(&mut self, rating: Option<Rating>) {
        self.pending.rating = rating;
    }

    pub fn set_remark(&mut self, remark: Option<String>) {
        self.pending.remark = remark;
    }

    /// Re-read the store, e.g. after another tool touched the file
    pub fn refresh(&mut self) {
        self.snapshot = self.store.load_annotations();
    }

    fn pending_patch(&self) -> AnnotationPatch {
        AnnotationPatch::new(self.reviewer.clone(), self.clock.review_date())
            .with_rating(self.pending.rating)
            .with_remark(self.pending.remark.clone())
    }

    fn save_pending(&mut self) -> Result<SaveOutcome> {
        let patch = self.pending_patch();
        let outcome = self.store.save_row(self.cursor.index(), &patch)?;
        if outcome == SaveOutcome::Saved {
            self.refresh();
        }
        Ok(outcome)
    }

    /// Save the pending edit at the current row without moving.
    ///
    /// On failure the pending edit is kept so the reviewer can retry.
    pub fn save(&mut self) -> Result<SaveOutcome> {
        let outcome = self.save_pending()?;
        self.pending = PendingEdit::for_generation(self.cursor.generation());
        Ok(outcome)
    }

    /// Save at the current row, advance the generation, then move
    pub fn navigate(&mut self, nav: Navigation) -> NavigationOutcome {
        let from = self.cursor.index();
        let save = self.save_pending();
        if let Err(e) = &save {
            tracing::warn!("Save before leaving row {} failed: {}", from + 1, e);
        }

        let to = self.cursor.advance(nav);
        self.pending = PendingEdit::for_generation(self.cursor.generation());
        NavigationOutcome { from, to, save }
    }

    pub fn current_view(&self) -> RowView<'_> {
        let index = self.cursor.index();
        let saved = self
            .snapshot
            .as_ref()
            .map(|t| AnnotationRow::from_table(t, index))
            .unwrap_or_default();
        RowView {
            index,
            total: self.cursor.len(),
            record: &self.store.source().records()[index],
            saved,
            pending: &self.pending,
        }
    }

    pub fn progress(&self) -> Progress {
        match &self.snapshot {
            Some(table) => compute_progress(table, self.cursor.len()),
            None => Progress {
                reviewed: 0,
                total: self.cursor.len(),
            },
        }
    }

    pub fn statistics(&self) -> Option<Statistics> {
        self.snapshot.as_ref().map(compute_statistics)
    }
}
