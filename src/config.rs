//! Dashboard configuration
//! JSON settings file with defaults, plus environment overrides.

use crate::data::DatasetSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Google Sheet CSV export link.
pub const DEFAULT_SOURCE_URL: &str = "https://docs.google.com/spreadsheets/d/1UNosydITZa7zCzwoAelfIaYN-iz3li35G6QCmNuU1-U/export?format=csv&gid=0";

/// Env var naming the config file.
pub const CONFIG_PATH_ENV: &str = "MOBILIZATION_DASHBOARD_CONFIG";
/// Env var overriding the source URL.
pub const SOURCE_URL_ENV: &str = "MOBILIZATION_DASHBOARD_URL";
/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Default file names offered by the save dialogs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportNames {
    pub clean_csv: String,
    pub filtered_csv: String,
    pub breakdown_xlsx: String,
    pub breakdown_png: String,
}

impl Default for ExportNames {
    fn default() -> Self {
        Self {
            clean_csv: "clean_mobilization_data.csv".to_string(),
            filtered_csv: "filtered_mobilization_data.csv".to_string(),
            breakdown_xlsx: "county_breakdown.xlsx".to_string(),
            breakdown_png: "county_breakdown.png".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub source_url: String,
    pub schema: DatasetSchema,
    pub request_timeout_secs: u64,
    pub log_level: String,
    pub export: ExportNames,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            schema: DatasetSchema::default(),
            request_timeout_secs: 30,
            log_level: "info".to_string(),
            export: ExportNames::default(),
        }
    }
}

impl DashboardConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Resolve config from the environment.
    ///
    /// Uses the file named by `MOBILIZATION_DASHBOARD_CONFIG`, else
    /// `dashboard.json` if it exists, else defaults; then applies
    /// `MOBILIZATION_DASHBOARD_URL`.
    pub fn resolve() -> Result<Self, ConfigError> {
        let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None if fallback.is_file() => Self::from_file(&fallback)?,
            None => Self::default(),
        };

        if let Ok(url) = std::env::var(SOURCE_URL_ENV) {
            if !url.trim().is_empty() {
                config.source_url = url;
            }
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().expect("tempfile");
        write!(
            file,
            r#"{{"request_timeout_secs": 5, "schema": {{"category_column": "Region"}}}}"#
        )
        .unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.schema.category_column, "Region");
        assert_eq!(config.schema.id_column, DatasetSchema::default().id_column);
        assert_eq!(config.source_url, DEFAULT_SOURCE_URL);
        assert_eq!(config.export, ExportNames::default());
    }

    #[test]
    fn test_invalid_json() {
        let mut file = NamedTempFile::new().expect("tempfile");
        write!(file, "not json").unwrap();
        let err = DashboardConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = DashboardConfig::from_file(Path::new("/nonexistent/dashboard.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/dashboard.json"));
    }
}
