//! Annotation rows and the patches that update them
//!
//! A patch carries what a reviewer entered for one row. Applying it never
//! clears a rating or remark that was saved earlier: empty inputs leave the
//! stored value alone. Reviewer name, type and date are always replaced.

use crate::rating::{Rating, ReviewerType};
use crate::storage::schema::{RATING, RATING_VALUE, REMARKS, REVIEWER, REVIEWER_TYPE, REVIEW_DATE};
use crate::table::Table;
use crate::{Error, Result};
use serde::Serialize;

/// Reviewer-contributed fields for one source record, as persisted.
///
/// Values are kept as stored text: files written by hand or by older
/// releases may hold labels this crate would not produce itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationRow {
    pub rating: String,
    pub rating_value: String,
    pub remark: String,
    pub reviewer_name: String,
    pub reviewer_type: String,
    pub reviewed_at: String,
}

impl AnnotationRow {
    /// Read row `index` of an annotation table; missing columns read as empty
    pub fn from_table(table: &Table, index: usize) -> Self {
        Self {
            rating: table.get_or_empty(index, RATING).to_string(),
            rating_value: table.get_or_empty(index, RATING_VALUE).to_string(),
            remark: table.get_or_empty(index, REMARKS).to_string(),
            reviewer_name: table.get_or_empty(index, REVIEWER).to_string(),
            reviewer_type: table.get_or_empty(index, REVIEWER_TYPE).to_string(),
            reviewed_at: table.get_or_empty(index, REVIEW_DATE).to_string(),
        }
    }

    /// A row counts as reviewed once it has a rating or a remark
    pub fn is_reviewed(&self) -> bool {
        !self.rating.trim().is_empty() || !self.remark.trim().is_empty()
    }

    /// Parsed rating, if the stored label is one of ours
    pub fn parsed_rating(&self) -> Option<Rating> {
        Rating::from_label(&self.rating)
    }

    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

/// Who is saving.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewerIdentity {
    pub name: String,
    pub reviewer_type: Option<ReviewerType>,
}

impl ReviewerIdentity {
    pub fn new(name: impl Into<String>, reviewer_type: Option<ReviewerType>) -> Self {
        Self {
            name: name.into(),
            reviewer_type,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && self.reviewer_type.is_some()
    }
}

/// How saves treat missing identity and empty edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePolicy {
    /// Reject saves without a reviewer name and type
    pub require_reviewer_identity: bool,
    /// Stamp reviewer and date even when neither rating nor remark is given
    pub stamp_empty_saves: bool,
    /// Name recorded when identity is optional and none was entered
    pub anonymous_name: String,
}

impl Default for SavePolicy {
    fn default() -> Self {
        Self {
            require_reviewer_identity: true,
            stamp_empty_saves: true,
            anonymous_name: "Anonymous".to_string(),
        }
    }
}

/// An edit to a single annotation row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationPatch {
    pub rating: Option<Rating>,
    pub remark: Option<String>,
    pub reviewer: ReviewerIdentity,
    pub timestamp: String,
}

impl AnnotationPatch {
    pub fn new(reviewer: ReviewerIdentity, timestamp: impl Into<String>) -> Self {
        Self {
            rating: None,
            remark: None,
            reviewer,
            timestamp: timestamp.into(),
        }
    }

    pub fn with_rating(mut self, rating: Option<Rating>) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_remark(mut self, remark: Option<String>) -> Self {
        self.remark = remark;
        self
    }

    /// Remark text, if it has anything besides whitespace
    pub fn remark_text(&self) -> Option<&str> {
        self.remark.as_deref().filter(|r| !r.trim().is_empty())
    }

    pub fn has_content(&self) -> bool {
        self.rating.is_some() || self.remark_text().is_some()
    }

    /// Check the patch against `policy`.
    ///
    /// Returns the reviewer name and type to record, or `None` if the patch
    /// should not be written at all.
    pub fn resolve_identity(&self, policy: &SavePolicy) -> Result<Option<(String, String)>> {
        if policy.require_reviewer_identity && !self.reviewer.is_complete() {
            return Err(Error::IdentityMissing);
        }
        if !policy.stamp_empty_saves && !self.has_content() {
            return Ok(None);
        }

        let name = match self.reviewer.name.trim() {
            "" => policy.anonymous_name.clone(),
            name => name.to_string(),
        };
        let reviewer_type = self
            .reviewer
            .reviewer_type
            .map(|t| t.as_str().to_string())
            .unwrap_or_default();
        Ok(Some((name, reviewer_type)))
    }

    /// Merge this patch into row `index` of a reconciled table.
    ///
    /// The table must already carry every annotation column and enough rows.
    pub fn apply_to(&self, table: &mut Table, index: usize, reviewer: &str, reviewer_type: &str) {
        if let Some(rating) = self.rating {
            table.set(index, RATING, rating.label());
            table.set(index, RATING_VALUE, rating.value().to_string());
        }
        if let Some(remark) = self.remark_text() {
            table.set(index, REMARKS, remark);
        }
        table.set(index, REVIEWER, reviewer);
        table.set(index, REVIEWER_TYPE, reviewer_type);
        table.set(index, REVIEW_DATE, self.timestamp.as_str());
    }
}
