//! Catalogue and photometry loading.
//!
//! The analysis code depends only on [`TimeSeries`](crate::models::TimeSeries)
//! and [`ObjectClassEntry`](crate::models::ObjectClassEntry). Where they come
//! from is hidden behind the repository traits:
//!
//! ```text
//!            ┌────────────────────────────┐
//!            │  ExplorerSession / shell   │
//!            └─────────────┬──────────────┘
//!                          │ FullRepository
//!      ┌───────────────────┼────────────────────┐
//!      ▼                   ▼                    ▼
//!  LocalRepository   FileRepository     PostgresRepository
//!   (in-memory)     (CSV via polars)    (diesel, r2d2 pool)
//! ```
//!
//! Use [`RepositoryFactory`] to build one from the environment or a TOML file:
//!
//! ```ignore
//! use ngts_explorer::db::RepositoryFactory;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let repo = RepositoryFactory::from_env().await?;
//!     let entries = repo.list_entries().await?;
//!     let lightcurve = repo.fetch_lightcurve(&entries[0]).await?;
//!     Ok(())
//! }
//! ```

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::PostgresConfig;
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}

pub use factory::{RepositoryFactory, RepositoryType};
pub use repo_config::{FileSources, RepositoryConfig};
#[cfg(feature = "file-repo")]
pub use repositories::FileRepository;
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    CatalogRepository, ErrorContext, FullRepository, PhotometryRepository, RepositoryError,
    RepositoryResult,
};
