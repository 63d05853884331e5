//! Rating scale and reviewer categories
//!
//! Ratings are persisted twice: once as the display label (`Rating`) and once
//! as the numeric value (`Rating_Value`) used for aggregation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Five-step rating of a model answer against the gold answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rating {
    VeryPoor,
    Poor,
    Fair,
    Good,
    Excellent,
}

impl Rating {
    /// Label as written to the `Rating` column
    pub fn label(&self) -> &'static str {
        match self {
            Rating::Excellent => "⭐⭐⭐⭐⭐ Excellent",
            Rating::Good => "⭐⭐⭐⭐ Good",
            Rating::Fair => "⭐⭐⭐ Fair",
            Rating::Poor => "⭐⭐ Poor",
            Rating::VeryPoor => "⭐ Very Poor",
        }
    }

    /// Name without the stars
    pub fn name(&self) -> &'static str {
        match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::Fair => "Fair",
            Rating::Poor => "Poor",
            Rating::VeryPoor => "Very Poor",
        }
    }

    /// Numeric value, 5 (Excellent) down to 1 (Very Poor)
    pub fn value(&self) -> u8 {
        match self {
            Rating::Excellent => 5,
            Rating::Good => 4,
            Rating::Fair => 3,
            Rating::Poor => 2,
            Rating::VeryPoor => 1,
        }
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            5 => Some(Rating::Excellent),
            4 => Some(Rating::Good),
            3 => Some(Rating::Fair),
            2 => Some(Rating::Poor),
            1 => Some(Rating::VeryPoor),
            _ => None,
        }
    }

    /// Exact match against a persisted label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().iter().copied().find(|r| r.label() == label.trim())
    }

    /// All ratings, best first (display order)
    pub fn all() -> &'static [Rating] {
        &[
            Rating::Excellent,
            Rating::Good,
            Rating::Fair,
            Rating::Poor,
            Rating::VeryPoor,
        ]
    }
}

impl FromStr for Rating {
    type Err = Error;

    /// Accepts the full label, the bare name, or a digit 1-5
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Some(rating) = Self::from_label(trimmed) {
            return Ok(rating);
        }
        if let Ok(n) = trimmed.parse::<u8>() {
            return Self::from_value(n).ok_or_else(|| Error::InvalidRating(s.to_string()));
        }

        let name: String = trimmed
            .trim_start_matches('⭐')
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match name.as_str() {
            "excellent" => Ok(Rating::Excellent),
            "good" => Ok(Rating::Good),
            "fair" => Ok(Rating::Fair),
            "poor" => Ok(Rating::Poor),
            "verypoor" => Ok(Rating::VeryPoor),
            _ => Err(Error::InvalidRating(s.to_string())),
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Who is doing the review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReviewerType {
    TaxPayer,
    NonTaxPayer,
    TaxOfficer,
}

impl ReviewerType {
    /// Placeholder shown before a type is chosen; never a real type
    pub const UNSET: &'static str = "Select Type";

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewerType::TaxPayer => "Tax Payer",
            ReviewerType::NonTaxPayer => "Non Tax Payer",
            ReviewerType::TaxOfficer => "Tax Officer",
        }
    }

    pub fn all() -> &'static [ReviewerType] {
        &[
            ReviewerType::TaxPayer,
            ReviewerType::NonTaxPayer,
            ReviewerType::TaxOfficer,
        ]
    }

    /// Parse user input; blank and the `Select Type` placeholder mean unset
    pub fn parse_optional(s: &str) -> Result<Option<Self>> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == Self::UNSET {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

impl FromStr for ReviewerType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "taxpayer" | "payer" => Ok(ReviewerType::TaxPayer),
            "nontaxpayer" | "nonpayer" => Ok(ReviewerType::NonTaxPayer),
            "taxofficer" | "officer" => Ok(ReviewerType::TaxOfficer),
            _ => Err(Error::InvalidReviewerType(s.to_string())),
        }
    }
}

impl std::fmt::Display for ReviewerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_value_mapping() {
        let values: Vec<u8> = Rating::all().iter().map(Rating::value).collect();
        assert_eq!(values, vec![5, 4, 3, 2, 1]);
        for rating in Rating::all() {
            assert_eq!(Rating::from_value(rating.value()), Some(*rating));
        }
        assert_eq!(Rating::from_value(0), None);
        assert_eq!(Rating::from_value(6), None);
    }

    #[test]
    fn test_parse_rating_forms() {
        assert_eq!("⭐⭐⭐⭐⭐ Excellent".parse::<Rating>().unwrap(), Rating::Excellent);
        assert_eq!("good".parse::<Rating>().unwrap(), Rating::Good);
        assert_eq!("Very Poor".parse::<Rating>().unwrap(), Rating::VeryPoor);
        assert_eq!("very_poor".parse::<Rating>().unwrap(), Rating::VeryPoor);
        assert_eq!("3".parse::<Rating>().unwrap(), Rating::Fair);
        assert!("7".parse::<Rating>().is_err());
        assert!("great".parse::<Rating>().is_err());
    }

    #[test]
    fn test_label_roundtrip() {
        assert_eq!(Rating::from_label("⭐⭐ Poor"), Some(Rating::Poor));
        assert_eq!(Rating::from_label("Poor"), None);
    }

    #[test]
    fn test_reviewer_type_parsing() {
        assert_eq!("Tax Officer".parse::<ReviewerType>().unwrap(), ReviewerType::TaxOfficer);
        assert_eq!("non-tax-payer".parse::<ReviewerType>().unwrap(), ReviewerType::NonTaxPayer);
        assert_eq!(ReviewerType::parse_optional("Select Type").unwrap(), None);
        assert_eq!(ReviewerType::parse_optional("  ").unwrap(), None);
        assert!(ReviewerType::parse_optional("auditor").is_err());
    }
}
