//! Review timestamps in a fixed civil timezone
//!
//! Review dates are written for people in one locale, not for machines, so
//! they use a configured UTC offset and a 12-hour clock.

use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, Offset, Utc};

/// `Review_Date` format, e.g. `2026-10-17 03:15:42 PM`
pub const REVIEW_DATE_FORMAT: &str = "%Y-%m-%d %I:%M:%S %p";

/// Suffix format for export file names
pub const EXPORT_SUFFIX_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Default offset: Asia/Dhaka, which has no daylight saving
pub const DEFAULT_OFFSET: &str = "+06:00";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewClock {
    offset: FixedOffset,
}

impl Default for ReviewClock {
    fn default() -> Self {
        Self {
            offset: FixedOffset::east_opt(6 * 3600).unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl ReviewClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Build from an offset string such as `+06:00`, `-0530`, `+6` or `UTC`
    pub fn from_offset_str(s: &str) -> Result<Self> {
        parse_offset(s).map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.offset)
    }

    /// Review date for an instant
    pub fn review_date_at(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format(REVIEW_DATE_FORMAT).to_string()
    }

    pub fn review_date(&self) -> String {
        self.review_date_at(Utc::now())
    }

    /// Export file name suffix for an instant
    pub fn export_suffix_at(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset).format(EXPORT_SUFFIX_FORMAT).to_string()
    }
}

fn parse_offset(s: &str) -> Result<FixedOffset> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return Ok(Utc.fix());
    }

    let invalid = || Error::Config(format!("invalid timezone offset '{}' (expected e.g. +06:00)", s));

    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None if rest.len() == 4 && rest.is_ascii() => rest.split_at(2),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
