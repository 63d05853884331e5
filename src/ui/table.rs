use crate::stats::Statistics;
use tabled::{Table, Tabled, settings::Style};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
struct HistogramRow {
    #[tabled(rename = "Rating")]
    label: String,
    #[tabled(rename = "Count")]
    count: usize,
    #[tabled(rename = "Share")]
    share: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

/// Rating distribution as a share of all `total` records
pub fn histogram_table(stats: &Statistics, total: usize) -> String {
    let rows: Vec<HistogramRow> = stats
        .rating_distribution(total)
        .into_iter()
        .map(|(label, count, pct)| HistogramRow {
            label,
            count,
            share: format!("{}%", pct),
        })
        .collect();
    if rows.is_empty() {
        return String::new();
    }

    Table::new(&rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_table_contains_rows() {
        let mut builder = TableBuilder::new();
        assert!(builder.build().is_empty());

        builder.add_row("Reviewed", "3/10 (30%)");
        builder.add_row("Average rating", "4.00");
        let out = builder.build();
        assert!(out.contains("Metric"));
        assert!(out.contains("3/10 (30%)"));
    }

    #[test]
    fn test_histogram_table_shares() {
        let mut stats = Statistics::default();
        stats.rating_histogram.insert("⭐⭐⭐⭐ Good".to_string(), 2);
        stats.rating_histogram.insert("⭐ Very Poor".to_string(), 1);
        let out = histogram_table(&stats, 4);
        assert!(out.contains("50%"));
        assert!(out.contains("25%"));
        assert!(histogram_table(&Statistics::default(), 4).is_empty());
    }
}
