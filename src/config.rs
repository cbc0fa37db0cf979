/// Service configuration loader - parses winds.toml
///
/// Holds the tunables: smoothing fractions, robustness passes and the
/// source table. The 60 kph outlier cutoff is a constant in `analysis::filters`.
///
/// # File Location
/// `winds.toml` in the current working directory (project root when running
/// via `cargo run`). A missing file means "use defaults"; a malformed one is
/// an error.

use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

use crate::analysis::loess::{DEFAULT_ROBUSTNESS_ITERATIONS, Loess, SmoothingError};

pub const DEFAULT_CONFIG_PATH: &str = "winds.toml";

/// Smoothing fraction for the seasonal (day-of-year) curve.
pub const DEFAULT_SEASONAL_FRACTION: f64 = 0.2;

/// Smoothing fraction for the wind/temperature scatter trends.
pub const DEFAULT_RELATIONSHIP_FRACTION: f64 = 0.5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("invalid [analysis] {field}: {source}")]
    InvalidFraction {
        field: &'static str,
        source: SmoothingError,
    },
}

/// Root structure of winds.toml
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub analysis: AnalysisConfig,
    pub database: DatabaseConfig,
}

/// `[analysis]` table
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub seasonal_fraction: f64,
    pub relationship_fraction: f64,
    pub robustness_iterations: usize,
    /// Run the four analyses on a thread pool
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            seasonal_fraction: DEFAULT_SEASONAL_FRACTION,
            relationship_fraction: DEFAULT_RELATIONSHIP_FRACTION,
            robustness_iterations: DEFAULT_ROBUSTNESS_ITERATIONS,
            parallel: false,
        }
    }
}

impl AnalysisConfig {
    /// Smoother for the seasonal curve.
    pub fn seasonal_smoother(&self) -> Result<Loess, SmoothingError> {
        Loess::new(self.seasonal_fraction)
            .map(|l| l.with_robustness_iterations(self.robustness_iterations))
    }

    /// Smoother for the wind/temperature trends.
    pub fn relationship_smoother(&self) -> Result<Loess, SmoothingError> {
        Loess::new(self.relationship_fraction)
            .map(|l| l.with_robustness_iterations(self.robustness_iterations))
    }

    /// Checks both fractions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.seasonal_smoother()
            .map_err(|source| ConfigError::InvalidFraction {
                field: "seasonal_fraction",
                source,
            })?;
        self.relationship_smoother()
            .map_err(|source| ConfigError::InvalidFraction {
                field: "relationship_fraction",
                source,
            })?;
        Ok(())
    }
}

/// `[database]` table
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            table: "winds_data".to_string(),
        }
    }
}

/// Parses configuration text and validates it.
pub fn parse_config(contents: &str, path: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(contents).map_err(|source| ConfigError::Parse {
        path: path.to_string(),
        source,
    })?;
    config.analysis.validate()?;
    Ok(config)
}

/// Loads configuration from `path`, falling back to defaults if the file
/// does not exist.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ConfigError> {
    let path_str = path.as_ref().display().to_string();

    match fs::read_to_string(&path) {
        Ok(contents) => parse_config(&contents, &path_str),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path_str, "no config file, using defaults");
            Ok(ServiceConfig::default())
        }
        Err(source) => Err(ConfigError::Read {
            path: path_str,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fractions() {
        let config = ServiceConfig::default();
        assert_eq!(config.analysis.seasonal_fraction, 0.2);
        assert_eq!(config.analysis.relationship_fraction, 0.5);
        assert_eq!(config.analysis.robustness_iterations, 3);
        assert!(!config.analysis.parallel);
        assert_eq!(config.database.table, "winds_data");
    }

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let config = parse_config("[analysis]\nseasonal_fraction = 0.3\n", "test.toml").unwrap();
        assert_eq!(config.analysis.seasonal_fraction, 0.3);
        assert_eq!(config.analysis.relationship_fraction, 0.5);
        assert_eq!(config.database.table, "winds_data");
    }

    #[test]
    fn test_parse_full_file() {
        let text = r#"
            [analysis]
            seasonal_fraction = 0.25
            relationship_fraction = 0.6
            robustness_iterations = 0
            parallel = true

            [database]
            table = "weather_snapshot"
        "#;
        let config = parse_config(text, "test.toml").unwrap();
        assert_eq!(config.analysis.robustness_iterations, 0);
        assert!(config.analysis.parallel);
        assert_eq!(config.database.table, "weather_snapshot");
    }

    #[test]
    fn test_invalid_fraction_rejected_on_load() {
        let err = parse_config("[analysis]\nrelationship_fraction = 1.5\n", "test.toml").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidFraction { field: "relationship_fraction", .. }
        ));
        assert!(err.to_string().contains("relationship_fraction"));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = parse_config("[analysis\nparallel = yes", "broken.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = load_config("definitely/not/here/winds.toml").unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_repository_config_file_loads() {
        let config = load_config(DEFAULT_CONFIG_PATH).expect("winds.toml should parse");
        assert!(config.analysis.validate().is_ok());
    }
}
