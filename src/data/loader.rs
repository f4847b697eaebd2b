//! CSV Data Loader Module
//! Fetches the source sheet and parses it into a DataFrame using Polars.

use crate::data::schema::DatasetSchema;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Source unavailable ({source_name}): {reason}")]
    SourceUnavailable { source_name: String, reason: String },
    #[error("Failed to parse CSV: {0}")]
    Parse(String),
    #[error("Missing required column: {0:?}")]
    MissingColumn(String),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Anything that can hand back the raw CSV payload.
pub trait DataSource: Send + Sync {
    /// Fetch the full payload.
    fn fetch(&self) -> Result<Vec<u8>, LoaderError>;

    /// Short label shown in the side panel.
    fn describe(&self) -> String;
}

/// Remote CSV export fetched over HTTPS.
pub struct HttpSource {
    url: String,
    timeout: Duration,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    fn unavailable(&self, reason: impl ToString) -> LoaderError {
        LoaderError::SourceUnavailable {
            source_name: self.url.clone(),
            reason: reason.to_string(),
        }
    }
}

impl DataSource for HttpSource {
    fn fetch(&self) -> Result<Vec<u8>, LoaderError> {
        info!(url = %self.url, "fetching remote sheet");

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| self.unavailable(e))?;

        let response = client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.unavailable(e))?;

        let bytes = response.bytes().map_err(|e| self.unavailable(e))?;
        debug!(bytes = bytes.len(), "remote sheet downloaded");
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        "Google Sheet (CSV export)".to_string()
    }
}

/// Local CSV file, picked from the file dialog.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataSource for FileSource {
    fn fetch(&self) -> Result<Vec<u8>, LoaderError> {
        info!(path = %self.path.display(), "reading local CSV");
        std::fs::read(&self.path).map_err(|e| LoaderError::SourceUnavailable {
            source_name: self.path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn describe(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Result of a successful load.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub df: DataFrame,
    pub has_timestamp: bool,
}

/// Accepted timestamp layouts, tried in order.
const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
];
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Parses CSV payloads into the dashboard's DataFrame shape.
pub struct DataLoader;

impl DataLoader {
    /// Fetch from `source` and parse the payload.
    pub fn load(
        source: &dyn DataSource,
        schema: &DatasetSchema,
    ) -> Result<LoadedDataset, LoaderError> {
        let bytes = source.fetch()?;
        Self::parse_csv(bytes, schema)
    }

    /// Parse raw CSV bytes.
    ///
    /// All columns are read as strings so identifiers keep their exact
    /// text; the timestamp column, if any, becomes a millisecond Datetime.
    pub fn parse_csv(bytes: Vec<u8>, schema: &DatasetSchema) -> Result<LoadedDataset, LoaderError> {
        if let Err(e) = std::str::from_utf8(&bytes) {
            return Err(LoaderError::Parse(format!("payload is not UTF-8 text: {}", e)));
        }

        let mut df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()
            .map_err(|e| LoaderError::Parse(e.to_string()))?;

        let has_timestamp = schema.validate(&df).map_err(LoaderError::MissingColumn)?;

        if has_timestamp {
            let parsed = Self::parse_timestamp_column(&df, &schema.timestamp_column)?;
            df.with_column(parsed)?;
        }

        info!(
            rows = df.height(),
            columns = df.width(),
            has_timestamp,
            "dataset parsed"
        );
        Ok(LoadedDataset { df, has_timestamp })
    }

    /// Convert the timestamp column to `Datetime(ms)`, coercing failures to null.
    fn parse_timestamp_column(df: &DataFrame, name: &str) -> Result<Column, LoaderError> {
        let raw = string_values(df, name)?;

        let mut coerced = 0usize;
        let millis: Vec<Option<i64>> = raw
            .iter()
            .map(|value| {
                let value = value.as_deref()?;
                let parsed = parse_timestamp(value);
                if parsed.is_none() {
                    coerced += 1;
                }
                parsed.map(|ts| ts.and_utc().timestamp_millis())
            })
            .collect();

        if coerced > 0 {
            warn!(column = name, coerced, "unparseable timestamps set to missing");
        }

        let column = Column::new(name.into(), millis)
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        Ok(column)
    }

    /// Get sorted unique non-missing values from a column.
    pub fn get_unique_values(df: &DataFrame, column: &str) -> Vec<String> {
        let mut values: Vec<String> = string_values(df, column)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .collect();
        values.sort();
        values.dedup();
        values
    }
}

/// Parse one timestamp cell. Returns `None` for anything unrecognised.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Read a column as optional strings, null for missing cells.
pub(crate) fn string_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Read a Datetime column as optional epoch milliseconds.
pub(crate) fn timestamp_millis(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    let physical = df.column(name)?.cast(&DataType::Int64)?;
    Ok(physical.i64()?.into_iter().collect())
}
