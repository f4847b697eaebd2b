//! Statistics Calculator Module
//! Record and distinct-value counts, plus the per-category breakdown.

use crate::data::{string_values, DatasetSchema};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};

/// Name of the count column in the breakdown table.
pub const COUNT_COLUMN: &str = "Count";

/// Headline numbers for one snapshot of the dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetStats {
    pub total_records: usize,
    pub unique_ids: usize,
    pub unique_phones: usize,
}

/// Number of records in one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Handles the dashboard's counting.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Count records and distinct non-missing identity and phone values.
    pub fn summarize(df: &DataFrame, schema: &DatasetSchema) -> PolarsResult<DatasetStats> {
        Ok(DatasetStats {
            total_records: df.height(),
            unique_ids: Self::count_distinct(df, &schema.id_column)?,
            unique_phones: Self::count_distinct(df, &schema.phone_column)?,
        })
    }

    fn count_distinct(df: &DataFrame, column: &str) -> PolarsResult<usize> {
        let values = string_values(df, column)?;
        Ok(values.iter().flatten().collect::<HashSet<_>>().len())
    }

    /// Group by category and count, largest first.
    ///
    /// Records with a missing category are left out. Equal counts keep the
    /// order in which their categories first appeared.
    pub fn count_by_category(df: &DataFrame, column: &str) -> PolarsResult<Vec<CategoryCount>> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<CategoryCount> = Vec::new();

        for category in string_values(df, column)?.into_iter().flatten() {
            let next = counts.len();
            let i = *index.entry(category.clone()).or_insert(next);
            if i == next {
                counts.push(CategoryCount { category, count: 0 });
            }
            counts[i].count += 1;
        }

        // Stable sort keeps first-seen order among ties.
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(counts)
    }

    /// Two-column table (`<category column>`, `Count`) for display and export.
    pub fn counts_to_frame(counts: &[CategoryCount], column: &str) -> PolarsResult<DataFrame> {
        let categories: Vec<&str> = counts.iter().map(|c| c.category.as_str()).collect();
        let values: Vec<u64> = counts.iter().map(|c| c.count as u64).collect();

        DataFrame::new(vec![
            Column::new(column.into(), categories),
            Column::new(COUNT_COLUMN.into(), values),
        ])
    }
}
