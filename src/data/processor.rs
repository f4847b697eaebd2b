//! Data Processor Module
//! Handles deduplication and the interactive category / date-range filters.

use crate::data::loader::{string_values, timestamp_millis};
use crate::data::schema::DatasetSchema;
use chrono::{NaiveDate, NaiveTime};
use polars::prelude::*;
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Missing required column: {0:?}")]
    MissingColumn(String),
}

/// Inclusive range over the timestamp column.
///
/// Both bounds sit at midnight of their day, so records later on the end
/// day fall outside the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether a timestamp (epoch millis) lies within `[start 00:00, end 00:00]`.
    pub fn contains_millis(&self, millis: i64) -> bool {
        midnight_millis(self.start) <= millis && millis <= midnight_millis(self.end)
    }
}

fn midnight_millis(day: NaiveDate) -> i64 {
    day.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Filter parameters fed by the side panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterParams {
    /// Empty set means no category filter.
    pub categories: BTreeSet<String>,
    pub date_range: Option<DateRange>,
}

impl FilterParams {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.date_range.is_none()
    }
}

/// Handles record-level cleaning and filtering.
pub struct DataProcessor;

impl DataProcessor {
    /// Drop records whose key pair was already seen, keeping the first.
    ///
    /// Missing values compare equal to each other.
    pub fn dedupe(df: &DataFrame, key_fields: (&str, &str)) -> Result<DataFrame, ProcessorError> {
        let first = Self::required_strings(df, key_fields.0)?;
        let second = Self::required_strings(df, key_fields.1)?;

        let mut seen: HashSet<(Option<String>, Option<String>)> =
            HashSet::with_capacity(df.height());
        let mask: BooleanChunked = first
            .into_iter()
            .zip(second)
            .map(|key| seen.insert(key))
            .collect();

        let clean = df.filter(&mask)?;
        debug!(
            before = df.height(),
            after = clean.height(),
            "deduplicated records"
        );
        Ok(clean)
    }

    /// Apply category membership and date range, combined with AND.
    pub fn filter(
        df: &DataFrame,
        schema: &DatasetSchema,
        params: &FilterParams,
    ) -> Result<DataFrame, ProcessorError> {
        if params.is_empty() {
            return Ok(df.clone());
        }

        let mut keep = vec![true; df.height()];

        if !params.categories.is_empty() {
            let categories = Self::required_strings(df, &schema.category_column)?;
            for (flag, category) in keep.iter_mut().zip(categories) {
                *flag &= category.is_some_and(|c| params.categories.contains(&c));
            }
        }

        if let Some(range) = params.date_range {
            if df.column(&schema.timestamp_column).is_err() {
                return Err(ProcessorError::MissingColumn(
                    schema.timestamp_column.clone(),
                ));
            }
            let stamps = timestamp_millis(df, &schema.timestamp_column)?;
            for (flag, stamp) in keep.iter_mut().zip(stamps) {
                *flag &= stamp.is_some_and(|ms| range.contains_millis(ms));
            }
        }

        let mask: BooleanChunked = keep.into_iter().collect();
        let filtered = df.filter(&mask)?;
        debug!(
            before = df.height(),
            after = filtered.height(),
            categories = params.categories.len(),
            date_range = params.date_range.is_some(),
            "filtered records"
        );
        Ok(filtered)
    }

    /// Render every row as display strings (empty for missing).
    pub fn to_display_rows(df: &DataFrame) -> Result<Vec<Vec<String>>, ProcessorError> {
        let columns: Vec<Vec<Option<String>>> = df
            .get_column_names()
            .iter()
            .map(|name| string_values(df, name))
            .collect::<PolarsResult<_>>()?;

        Ok((0..df.height())
            .map(|row| {
                columns
                    .iter()
                    .map(|col| col[row].clone().unwrap_or_default())
                    .collect()
            })
            .collect())
    }

    fn required_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, ProcessorError> {
        if df.column(name).is_err() {
            return Err(ProcessorError::MissingColumn(name.to_string()));
        }
        Ok(string_values(df, name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DataLoader;

    fn schema() -> DatasetSchema {
        DatasetSchema {
            id_column: "id".into(),
            phone_column: "phone".into(),
            category_column: "county".into(),
            timestamp_column: "Timestamp".into(),
        }
    }

    fn load(csv: &str) -> DataFrame {
        DataLoader::parse_csv(csv.as_bytes().to_vec(), &schema())
            .unwrap()
            .df
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let df = load(
            "id,phone,county,note\n\
             1,100,A,r1\n\
             2,200,A,r2\n\
             3,300,B,r3\n\
             2,200,B,r4\n\
             5,500,C,r5\n",
        );
        let clean = DataProcessor::dedupe(&df, schema().key_fields()).unwrap();
        assert_eq!(clean.height(), 4);

        let notes = string_values(&clean, "note").unwrap();
        let notes: Vec<&str> = notes.iter().map(|n| n.as_deref().unwrap()).collect();
        assert_eq!(notes, vec!["r1", "r2", "r3", "r5"]);
    }

    #[test]
    fn test_dedupe_treats_missing_keys_as_equal() {
        let df = load("id,phone,county\n,100,A\n,100,B\n1,,C\n1,,D\n1,100,E\n");
        let clean = DataProcessor::dedupe(&df, schema().key_fields()).unwrap();
        let counties = string_values(&clean, "county").unwrap();
        assert_eq!(
            counties,
            vec![Some("A".into()), Some("C".into()), Some("E".into())]
        );
    }

    #[test]
    fn test_dedupe_requires_key_columns() {
        let df = load("id,phone,county\n1,2,A\n");
        let err = DataProcessor::dedupe(&df, ("id", "missing")).unwrap_err();
        assert!(matches!(err, ProcessorError::MissingColumn(ref c) if c == "missing"));
    }

    #[test]
    fn test_category_filter() {
        let df = load("id,phone,county\n1,1,A\n2,2,A\n3,3,B\n4,4,\n");
        let params = FilterParams {
            categories: ["B".to_string()].into_iter().collect(),
            date_range: None,
        };
        let filtered = DataProcessor::filter(&df, &schema(), &params).unwrap();
        assert_eq!(filtered.height(), 1);
    }

    #[test]
    fn test_empty_params_are_noop() {
        let df = load("id,phone,county\n1,1,A\n2,2,\n");
        let filtered = DataProcessor::filter(&df, &schema(), &FilterParams::default()).unwrap();
        assert!(filtered.equals_missing(&df));
    }

    #[test]
    fn test_date_range_is_inclusive_and_drops_missing() {
        let df = load(
            "Timestamp,id,phone,county\n\
             2024-01-15,1,1,A\n\
             2024-02-01,2,2,A\n\
             ,3,3,A\n\
             2024-01-01 00:00:00,4,4,A\n\
             2024-01-31 00:00:00,5,5,A\n",
        );
        let params = FilterParams {
            categories: BTreeSet::new(),
            date_range: Some(DateRange::new(date(2024, 1, 1), date(2024, 1, 31))),
        };
        let filtered = DataProcessor::filter(&df, &schema(), &params).unwrap();
        let ids = string_values(&filtered, "id").unwrap();
        assert_eq!(
            ids,
            vec![Some("1".into()), Some("4".into()), Some("5".into())]
        );
    }

    #[test]
    fn test_date_range_end_bound_is_midnight() {
        let df = load(
            "Timestamp,id,phone,county\n\
             2024-01-30 23:59:59,1,1,A\n\
             2024-01-31 00:00:00.001,2,2,A\n\
             2024-01-31 18:45:00,3,3,A\n",
        );
        let params = FilterParams {
            categories: BTreeSet::new(),
            date_range: Some(DateRange::new(date(2024, 1, 1), date(2024, 1, 31))),
        };
        let filtered = DataProcessor::filter(&df, &schema(), &params).unwrap();
        let ids = string_values(&filtered, "id").unwrap();
        assert_eq!(ids, vec![Some("1".into())]);
    }

    #[test]
    fn test_reversed_date_range_is_empty() {
        let df = load("Timestamp,id,phone,county\n2024-01-15,1,1,A\n");
        let params = FilterParams {
            categories: BTreeSet::new(),
            date_range: Some(DateRange::new(date(2024, 1, 31), date(2024, 1, 1))),
        };
        let filtered = DataProcessor::filter(&df, &schema(), &params).unwrap();
        assert_eq!(filtered.height(), 0);
    }

    #[test]
    fn test_filters_compose_with_and() {
        let df = load(
            "Timestamp,id,phone,county\n\
             2024-01-10,1,1,A\n\
             2024-01-11,2,2,B\n\
             2024-03-01,3,3,A\n",
        );
        let params = FilterParams {
            categories: ["A".to_string()].into_iter().collect(),
            date_range: Some(DateRange::new(date(2024, 1, 1), date(2024, 1, 31))),
        };
        let filtered = DataProcessor::filter(&df, &schema(), &params).unwrap();
        let ids = string_values(&filtered, "id").unwrap();
        assert_eq!(ids, vec![Some("1".into())]);
    }

    #[test]
    fn test_date_range_without_timestamp_column() {
        let df = load("id,phone,county\n1,1,A\n");
        let params = FilterParams {
            categories: BTreeSet::new(),
            date_range: Some(DateRange::new(date(2024, 1, 1), date(2024, 1, 31))),
        };
        let err = DataProcessor::filter(&df, &schema(), &params).unwrap_err();
        assert!(matches!(err, ProcessorError::MissingColumn(_)));
    }

    #[test]
    fn test_display_rows() {
        let df = load("id,phone,county\n1,,A\n2,2,B\n3,3,C\n");
        let rows = DataProcessor::to_display_rows(&df).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["1".to_string(), String::new(), "A".to_string()]);
        assert_eq!(rows[2], vec!["3".to_string(), "3".to_string(), "C".to_string()]);
    }
}
