//! Explorer configuration.
//!
//! One TOML file holds the repository settings and the default periodogram
//! settings:
//!
//! ```toml
//! [repository]
//! type = "file"
//!
//! [files]
//! match_file = "crossmatch.csv"
//! data_file = "photometry.csv"
//!
//! [periodogram]
//! min_period = 0.1
//! max_period = 1.0
//! n_frequencies = 250
//! ```
//!
//! Environment variables override the file: `REPOSITORY_TYPE`,
//! `DATABASE_URL` / `PG_DATABASE_URL`, `NGTS_MATCH_FILE`, `NGTS_DATA_FILE`
//! and `NGTS_AIRMASS_FILE`.

use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::algorithms::PeriodogramConfig;
use crate::db::{FileSources, RepositoryConfig, RepositoryError, RepositoryType};

const CONFIG_FILE: &str = "explorer.toml";

/// Settings for an explorer session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExplorerConfig {
    #[serde(flatten)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub periodogram: PeriodogramConfig,
}

impl ExplorerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RepositoryError> {
        toml::from_str(content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// First `explorer.toml` found in the current directory, `backend/`, or
    /// the parent directory.
    pub fn from_default_location() -> Result<Option<Self>, RepositoryError> {
        let search_paths = [
            PathBuf::from(CONFIG_FILE),
            PathBuf::from("backend").join(CONFIG_FILE),
            PathBuf::from("..").join(CONFIG_FILE),
        ];

        for path in search_paths {
            if path.exists() {
                info!("Using configuration {}", path.display());
                return Self::from_file(&path).map(Some);
            }
        }
        Ok(None)
    }

    /// Configuration from `path`, else the default location, else built-in
    /// defaults, with environment overrides applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, RepositoryError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::from_default_location()? {
                Some(config) => config,
                None => {
                    debug!("No {} found, using defaults", CONFIG_FILE);
                    let mut config = Self::default();
                    config.repository.repository.repo_type =
                        RepositoryType::from_env().as_str().to_string();
                    config
                }
            },
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(repo_type) = std::env::var("REPOSITORY_TYPE") {
            self.repository.repository.repo_type = repo_type;
        }
        if let Ok(url) = std::env::var("DATABASE_URL").or_else(|_| std::env::var("PG_DATABASE_URL"))
        {
            self.repository.postgres.database_url = url;
        }

        match (self.repository.files.as_mut(), FileSources::from_env()) {
            (_, Some(sources)) => self.repository.files = Some(sources),
            (Some(files), None) => {
                if let Ok(path) = std::env::var("NGTS_MATCH_FILE") {
                    files.match_file = path.into();
                }
                if let Ok(path) = std::env::var("NGTS_DATA_FILE") {
                    files.data_file = path.into();
                }
                if let Ok(path) = std::env::var("NGTS_AIRMASS_FILE") {
                    files.airmass_file = Some(path.into());
                }
            }
            (None, None) => {}
        }
    }

    /// Read from explicit table paths, as given on the command line.
    pub fn with_file_sources(mut self, sources: FileSources) -> Self {
        self.repository.repository.repo_type = RepositoryType::File.as_str().to_string();
        self.repository.files = Some(sources);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let config = ExplorerConfig::from_toml_str(
            r#"
[repository]
type = "file"

[files]
match_file = "crossmatch.csv"
data_file = "photometry.csv"
airmass_file = "headers.csv"

[periodogram]
min_period = 0.1
max_period = 1.0
n_frequencies = 250
detrend = true
"#,
        )
        .unwrap();

        assert_eq!(
            config.repository.repository_type().unwrap(),
            RepositoryType::File
        );
        let files = config.repository.files.as_ref().unwrap();
        assert_eq!(files.airmass_file, Some(PathBuf::from("headers.csv")));
        assert_eq!(config.periodogram.n_frequencies, 250);
        assert_eq!(config.periodogram.min_period, Some(0.1));
        assert!(config.periodogram.detrend);
        assert!(config.periodogram.parallel);
    }

    #[test]
    fn test_periodogram_defaults_when_section_missing() {
        let config = ExplorerConfig::from_toml_str("[repository]\ntype = \"local\"\n").unwrap();
        assert_eq!(config.periodogram, PeriodogramConfig::default());
    }

    #[test]
    fn test_with_file_sources_switches_backend() {
        let config = ExplorerConfig::default()
            .with_file_sources(FileSources::new("m.csv", "d.csv"));
        assert_eq!(
            config.repository.repository_type().unwrap(),
            RepositoryType::File
        );
        assert!(config.repository.file_sources().unwrap().is_some());
    }

    #[test]
    fn test_bad_toml_is_configuration_error() {
        let err = ExplorerConfig::from_toml_str("[periodogram]\nn_frequencies = \"many\"").unwrap_err();
        assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
    }
}
