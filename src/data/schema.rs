//! Dataset Schema Module
//! Names the columns the dashboard relies on and checks them once at load time.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column names for the fields the pipeline reads.
///
/// Every other column in the source passes through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSchema {
    pub id_column: String,
    pub phone_column: String,
    pub category_column: String,
    pub timestamp_column: String,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self {
            id_column: "Verified ID Number(Verify before entry)".to_string(),
            // The source sheet header really does start with a space.
            phone_column: " Phone Number(verify before entry)".to_string(),
            category_column: "County".to_string(),
            timestamp_column: "Timestamp".to_string(),
        }
    }
}

impl DatasetSchema {
    /// Composite key used to detect duplicate records.
    pub fn key_fields(&self) -> (&str, &str) {
        (&self.id_column, &self.phone_column)
    }

    /// Required columns, in the order they are checked.
    pub fn required_columns(&self) -> [&str; 3] {
        [&self.id_column, &self.phone_column, &self.category_column]
    }

    /// Check that all required columns exist.
    ///
    /// Returns the first missing column name on failure, and otherwise
    /// whether the optional timestamp column is present.
    pub fn validate(&self, df: &DataFrame) -> Result<bool, String> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        if let Some(missing) = self
            .required_columns()
            .into_iter()
            .find(|required| !names.iter().any(|n| n == required))
        {
            return Err(missing.to_string());
        }

        Ok(names.iter().any(|n| n == &self.timestamp_column))
    }
}
