//! Repository traits for catalogue and photometry access.
//!
//! The explorer reads two things: the crossmatch catalogue (which objects
//! exist and how they are classified) and one lightcurve per object. Each is
//! a trait so that file, in-memory and database backends can be swapped
//! without the analysis code noticing.

use async_trait::async_trait;

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use crate::models::{ObjectClassEntry, TimeSeries};

/// Read access to the crossmatch catalogue.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Check that the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Every crossmatched object, in storage order.
    async fn list_entries(&self) -> RepositoryResult<Vec<ObjectClassEntry>>;
}

/// Read access to per-object photometry.
#[async_trait]
pub trait PhotometryRepository: Send + Sync {
    /// The lightcurve of `entry`, sorted by time.
    ///
    /// Fluxes are returned as stored; non-finite samples are kept and
    /// filtered by the analysis that consumes them. Airmass is attached to
    /// each sample when the backend has exposure headers.
    ///
    /// # Errors
    /// * `NotFound` if the entry has no sequence number or no stored rows
    async fn fetch_lightcurve(&self, entry: &ObjectClassEntry) -> RepositoryResult<TimeSeries>;
}

/// Everything the explorer needs from a backend.
pub trait FullRepository: CatalogRepository + PhotometryRepository {}

impl<T> FullRepository for T where T: CatalogRepository + PhotometryRepository {}

/// `NotFound` for an entry that does not say where its lightcurve lives.
pub(crate) fn missing_sequence_number(entry: &ObjectClassEntry) -> RepositoryError {
    RepositoryError::not_found_with_context(
        "object has no photometry sequence number",
        ErrorContext::new("fetch_lightcurve")
            .with_entity("crossmatch")
            .with_entity_id(&entry.id),
    )
}
