//! Repository implementations:
//! - `local`: in-memory, for tests and hand-built datasets
//! - `file`: crossmatch and photometry CSV tables read with polars
//! - `postgres`: PostgreSQL with Diesel ORM
#[cfg(feature = "file-repo")]
pub mod file;
pub mod local;
#[cfg(feature = "postgres-repo")]
pub mod postgres;

#[cfg(feature = "file-repo")]
pub use file::FileRepository;
pub use local::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use postgres::{PostgresConfig, PostgresRepository};
