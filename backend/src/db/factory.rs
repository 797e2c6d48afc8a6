//! Repository factory: pick and build a backend from runtime configuration.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use log::info;

use super::repo_config::{FileSources, RepositoryConfig};
#[cfg(feature = "file-repo")]
use super::repositories::FileRepository;
use super::repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
use super::repositories::PostgresRepository;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};
use super::PostgresConfig;

/// Repository backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory local repository
    Local,
    /// CSV crossmatch and photometry tables
    File,
    /// Postgres + Diesel implementation
    Postgres,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Accepts "local", "file" (or "csv") and "postgres" (or "pg"), any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            "file" | "csv" => Ok(Self::File),
            "postgres" | "pg" => Ok(Self::Postgres),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::File => "file",
            Self::Postgres => "postgres",
        }
    }

    /// Backend selected by the environment.
    ///
    /// `REPOSITORY_TYPE` wins when set. Otherwise a database URL selects
    /// Postgres, `NGTS_MATCH_FILE` plus `NGTS_DATA_FILE` select File, and
    /// anything else is Local.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val.parse().unwrap_or(Self::Local);
        }

        if std::env::var("DATABASE_URL").is_ok() || std::env::var("PG_DATABASE_URL").is_ok() {
            Self::Postgres
        } else if FileSources::from_env().is_some() {
            Self::File
        } else {
            Self::Local
        }
    }
}

/// Builds repository instances.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository of `repo_type`.
    ///
    /// `files` is required for File, `postgres_config` for Postgres.
    pub async fn create(
        repo_type: RepositoryType,
        files: Option<&FileSources>,
        postgres_config: Option<&PostgresConfig>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        info!("Creating {:?} repository", repo_type);
        match repo_type {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::File => {
                let files = files.ok_or_else(|| {
                    RepositoryError::configuration("File repository requires match and data files")
                })?;
                Self::create_file(files).await
            }
            RepositoryType::Postgres => {
                #[cfg(feature = "postgres-repo")]
                {
                    let config = postgres_config.ok_or_else(|| {
                        RepositoryError::configuration(
                            "Postgres repository requires PostgresConfig",
                        )
                    })?;
                    let pg = Self::create_postgres(config).await?;
                    Ok(pg as Arc<dyn FullRepository>)
                }
                #[cfg(not(feature = "postgres-repo"))]
                {
                    let _ = postgres_config;
                    Err(RepositoryError::configuration(
                        "Postgres repository feature not enabled",
                    ))
                }
            }
        }
    }

    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Read the CSV tables on a blocking thread.
    #[cfg(feature = "file-repo")]
    pub async fn create_file(files: &FileSources) -> RepositoryResult<Arc<dyn FullRepository>> {
        let files = files.clone();
        let repo = tokio::task::spawn_blocking(move || FileRepository::open(files))
            .await
            .map_err(|e| RepositoryError::internal(format!("Task join error: {}", e)))??;
        Ok(Arc::new(repo))
    }

    #[cfg(not(feature = "file-repo"))]
    pub async fn create_file(files: &FileSources) -> RepositoryResult<Arc<dyn FullRepository>> {
        let _ = files;
        Err(RepositoryError::configuration(
            "File repository feature not enabled",
        ))
    }

    #[cfg(feature = "postgres-repo")]
    pub async fn create_postgres(
        config: &PostgresConfig,
    ) -> RepositoryResult<Arc<PostgresRepository>> {
        let config = config.clone();
        let repo = tokio::task::spawn_blocking(move || PostgresRepository::new(config))
            .await
            .map_err(|e| RepositoryError::internal(format!("Task join error: {}", e)))??;
        Ok(Arc::new(repo))
    }

    /// Create the repository selected by [`RepositoryType::from_env`].
    pub async fn from_env() -> RepositoryResult<Arc<dyn FullRepository>> {
        match RepositoryType::from_env() {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::File => {
                let files = FileSources::from_env().ok_or_else(|| {
                    RepositoryError::configuration(
                        "NGTS_MATCH_FILE and NGTS_DATA_FILE must be set",
                    )
                })?;
                Self::create_file(&files).await
            }
            RepositoryType::Postgres => {
                #[cfg(feature = "postgres-repo")]
                {
                    let config =
                        PostgresConfig::from_env().map_err(RepositoryError::configuration)?;
                    let pg = Self::create_postgres(&config).await?;
                    Ok(pg as Arc<dyn FullRepository>)
                }
                #[cfg(not(feature = "postgres-repo"))]
                {
                    Err(RepositoryError::configuration(
                        "Postgres repository feature not enabled",
                    ))
                }
            }
        }
    }

    pub async fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = RepositoryConfig::from_file(config_path)?;
        Self::from_repository_config(&config).await
    }

    pub async fn from_repository_config(
        config: &RepositoryConfig,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo_type = config
            .repository_type()
            .map_err(|e| RepositoryError::configuration(format!("Invalid repository type: {}", e)))?;
        let files = config.file_sources()?;
        let postgres = config.to_postgres_config()?;
        Self::create(repo_type, files.as_ref(), postgres.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::CatalogRepository;

    #[test]
    fn test_repository_type_from_str() {
        assert_eq!(RepositoryType::from_str("local").unwrap(), RepositoryType::Local);
        assert_eq!(RepositoryType::from_str("CSV").unwrap(), RepositoryType::File);
        assert_eq!(RepositoryType::from_str("Pg").unwrap(), RepositoryType::Postgres);
        assert!(RepositoryType::from_str("fits").is_err());
    }

    #[tokio::test]
    async fn test_create_local_repository() {
        let repo = RepositoryFactory::create_local();
        assert!(repo.health_check().await.unwrap());
        assert!(repo.list_entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_type_requires_sources() {
        let err = RepositoryFactory::create(RepositoryType::File, None, None)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RepositoryError::ConfigurationError { .. }));
    }
}
