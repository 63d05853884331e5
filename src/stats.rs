//! Review progress and rating statistics
//!
//! Both work on the annotation table as stored, so they also cover files
//! written by hand or by older releases.

use crate::rating::ReviewerType;
use crate::storage::schema::{RATING, RATING_VALUE, REMARKS, REVIEWER_TYPE};
use crate::table::Table;
use serde::Serialize;
use std::collections::BTreeMap;

/// How many source records have been reviewed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub reviewed: usize,
    pub total: usize,
}

impl Progress {
    /// Integer percentage, truncated
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            return 0;
        }
        self.reviewed * 100 / self.total
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} ({}%)", self.reviewed, self.total, self.percent())
    }
}

/// Count rows with a non-blank rating or remark among the first `source_count` rows
pub fn compute_progress(table: &Table, source_count: usize) -> Progress {
    let rows = table.len().min(source_count);
    let reviewed = (0..rows)
        .filter(|&i| {
            !table.get_or_empty(i, RATING).trim().is_empty()
                || !table.get_or_empty(i, REMARKS).trim().is_empty()
        })
        .count();

    Progress {
        reviewed,
        total: source_count,
    }
}

/// Aggregates over the annotation table
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    /// Mean of numeric `Rating_Value` cells, absent when none parse
    pub average_rating: Option<f64>,
    /// Number of `Rating_Value` cells that parsed as numbers
    pub rated_count: usize,
    pub rating_histogram: BTreeMap<String, usize>,
    pub reviewer_type_histogram: BTreeMap<String, usize>,
}

impl Statistics {
    /// Share of `total` records that carry a numeric rating, truncated
    pub fn completion_percent(&self, total: usize) -> usize {
        if total == 0 {
            return 0;
        }
        self.rated_count * 100 / total
    }

    /// Rating labels with count and share of `total`, most frequent first
    pub fn rating_distribution(&self, total: usize) -> Vec<(String, usize, usize)> {
        let mut dist: Vec<(String, usize, usize)> = self
            .rating_histogram
            .iter()
            .map(|(label, &count)| {
                let pct = if total == 0 { 0 } else { count * 100 / total };
                (label.clone(), count, pct)
            })
            .collect();
        dist.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        dist
    }
}

/// Average rating plus rating and reviewer-type histograms
pub fn compute_statistics(table: &Table) -> Statistics {
    let values: Vec<f64> = table
        .column(RATING_VALUE)
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect();

    let average_rating = if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    };

    Statistics {
        average_rating,
        rated_count: values.len(),
        rating_histogram: histogram(table.column(RATING), |_| true),
        reviewer_type_histogram: histogram(table.column(REVIEWER_TYPE), |t| t != ReviewerType::UNSET),
    }
}

fn histogram<'a>(cells: impl Iterator<Item = &'a str>, keep: impl Fn(&str) -> bool) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for cell in cells.map(str::trim).filter(|c| !c.is_empty() && keep(*c)) {
        *counts.entry(cell.to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::schema::ANNOTATION_COLUMNS;

    fn annotations(rows: &[(&str, &str, &str, &str)]) -> Table {
        let mut table = Table::new(ANNOTATION_COLUMNS.iter().map(|c| c.to_string()).collect());
        for (rating, value, remark, kind) in rows {
            table.pad_rows(table.len() + 1);
            let i = table.len() - 1;
            table.set(i, RATING, *rating);
            table.set(i, RATING_VALUE, *value);
            table.set(i, REMARKS, *remark);
            table.set(i, REVIEWER_TYPE, *kind);
        }
        table
    }

    #[test]
    fn test_average_and_histograms() {
        let table = annotations(&[
            ("⭐⭐⭐⭐⭐ Excellent", "5", "", "Tax Officer"),
            ("⭐⭐⭐⭐ Good", "4", "", "Tax Payer"),
            ("", "", "", "Select Type"),
            ("⭐⭐⭐ Fair", "3", "", "Tax Officer"),
        ]);

        let stats = compute_statistics(&table);
        assert_eq!(stats.average_rating, Some(4.0));
        assert_eq!(stats.rated_count, 3);
        assert_eq!(stats.rating_histogram.len(), 3);
        assert_eq!(stats.rating_histogram["⭐⭐⭐⭐⭐ Excellent"], 1);
        assert_eq!(stats.rating_histogram["⭐⭐⭐⭐ Good"], 1);
        assert_eq!(stats.rating_histogram["⭐⭐⭐ Fair"], 1);
        assert_eq!(stats.reviewer_type_histogram["Tax Officer"], 2);
        assert!(!stats.reviewer_type_histogram.contains_key("Select Type"));
        assert_eq!(stats.completion_percent(4), 75);
    }

    #[test]
    fn test_float_values_and_garbage() {
        let table = annotations(&[("a", "5.0", "", ""), ("b", "n/a", "", ""), ("c", "2", "", "")]);
        let stats = compute_statistics(&table);
        assert_eq!(stats.average_rating, Some(3.5));
        assert_eq!(stats.rated_count, 2);
    }

    #[test]
    fn test_no_ratings_means_no_average() {
        let table = annotations(&[("", "", "remark only", "")]);
        let stats = compute_statistics(&table);
        assert_eq!(stats.average_rating, None);
        assert!(stats.rating_histogram.is_empty());

        let bare = Table::new(vec!["Question".into()]);
        assert_eq!(compute_statistics(&bare), Statistics::default());
    }

    #[test]
    fn test_progress_counts_rating_or_remark() {
        let table = annotations(&[
            ("⭐⭐ Poor", "2", "", ""),
            ("", "", "  ", ""),
            ("", "", "needs citation", ""),
            ("⭐ Very Poor", "1", "", ""),
        ]);

        assert_eq!(compute_progress(&table, 4), Progress { reviewed: 3, total: 4 });
        // Rows past the source length are not counted
        assert_eq!(compute_progress(&table, 2), Progress { reviewed: 1, total: 2 });
        assert_eq!(compute_progress(&table, 10).to_string(), "3/10 (30%)");
    }

    #[test]
    fn test_distribution_order() {
        let table = annotations(&[
            ("⭐⭐⭐ Fair", "3", "", ""),
            ("⭐⭐⭐⭐ Good", "4", "", ""),
            ("⭐⭐⭐ Fair", "3", "", ""),
        ]);
        let dist = compute_statistics(&table).rating_distribution(4);
        assert_eq!(dist[0], ("⭐⭐⭐ Fair".to_string(), 2, 50));
        assert_eq!(dist[1], ("⭐⭐⭐⭐ Good".to_string(), 1, 25));
    }
}
