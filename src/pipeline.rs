//! Dashboard Pipeline
//! Runs dedupe, stats, filtering and aggregation as one render cycle.

use crate::data::{DataLoader, DataProcessor, DatasetSchema, FilterParams, ProcessorError};
use crate::stats::{CategoryCount, DatasetStats, StatsCalculator};
use polars::prelude::*;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Everything one frame of the dashboard shows.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub raw_stats: DatasetStats,
    pub clean: DataFrame,
    pub clean_stats: DatasetStats,
    pub filtered: DataFrame,
    pub category_counts: Vec<CategoryCount>,
    /// Sorted distinct categories of the clean data, for the multi-select.
    pub category_options: Vec<String>,
}

impl DashboardView {
    /// Count table of the filtered data as a DataFrame.
    pub fn counts_frame(&self, schema: &DatasetSchema) -> PolarsResult<DataFrame> {
        StatsCalculator::counts_to_frame(&self.category_counts, &schema.category_column)
    }
}

pub struct Pipeline;

impl Pipeline {
    /// Recompute every derived view from the raw dataset.
    ///
    /// Any failing stage aborts the whole cycle.
    pub fn run(
        raw: &DataFrame,
        schema: &DatasetSchema,
        params: &FilterParams,
    ) -> Result<DashboardView, PipelineError> {
        let raw_stats = StatsCalculator::summarize(raw, schema)?;

        let clean = DataProcessor::dedupe(raw, schema.key_fields())?;
        let clean_stats = StatsCalculator::summarize(&clean, schema)?;

        let filtered = DataProcessor::filter(&clean, schema, params)?;
        let category_counts =
            StatsCalculator::count_by_category(&filtered, &schema.category_column)?;
        let category_options = DataLoader::get_unique_values(&clean, &schema.category_column);

        info!(
            raw = raw_stats.total_records,
            clean = clean_stats.total_records,
            filtered = filtered.height(),
            categories = category_counts.len(),
            "pipeline recomputed"
        );

        Ok(DashboardView {
            raw_stats,
            clean,
            clean_stats,
            filtered,
            category_counts,
            category_options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DateRange;
    use chrono::NaiveDate;

    fn schema() -> DatasetSchema {
        DatasetSchema {
            id_column: "id".into(),
            phone_column: "phone".into(),
            category_column: "county".into(),
            timestamp_column: "Timestamp".into(),
        }
    }

    const CSV: &str = "Timestamp,id,phone,county\n\
                       2024-01-05,1,100,Kisumu\n\
                       2024-01-06,2,200,Nairobi\n\
                       2024-01-07,2,200,Nairobi\n\
                       2024-02-10,3,300,Nairobi\n\
                       2024-01-20,4,400,\n";

    fn raw() -> DataFrame {
        DataLoader::parse_csv(CSV.as_bytes().to_vec(), &schema())
            .unwrap()
            .df
    }

    #[test]
    fn test_run_without_filters() {
        let view = Pipeline::run(&raw(), &schema(), &FilterParams::default()).unwrap();
        assert_eq!(view.raw_stats.total_records, 5);
        assert_eq!(view.clean_stats.total_records, 4);
        assert_eq!(view.clean_stats.unique_ids, 4);
        assert_eq!(view.filtered.height(), 4);
        assert_eq!(view.category_counts[0].category, "Nairobi");
        assert_eq!(view.category_counts[0].count, 2);
        assert_eq!(
            view.category_options,
            vec!["Kisumu".to_string(), "Nairobi".to_string()]
        );
    }

    #[test]
    fn test_run_with_date_range() {
        let params = FilterParams {
            categories: Default::default(),
            date_range: Some(DateRange::new(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            )),
        };
        let view = Pipeline::run(&raw(), &schema(), &params).unwrap();
        assert_eq!(view.filtered.height(), 3);
        // The missing-county record passes the date filter but is not counted.
        let counted: usize = view.category_counts.iter().map(|c| c.count).sum();
        assert_eq!(counted, 2);

        let frame = view.counts_frame(&schema()).unwrap();
        assert_eq!(frame.height(), 2);
    }
}
