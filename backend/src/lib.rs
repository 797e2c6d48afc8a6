//! # NGTS Lightcurve Explorer
//!
//! Browse NGTS photometry of catalogue-crossmatched objects and look for
//! periodic variability.
//!
//! ## Features
//!
//! - **Period search**: generalised Lomb-Scargle periodogram over a frequency
//!   grid, evaluated in parallel with rayon
//! - **Detrending**: removal of a linear airmass trend, flux to magnitude conversion
//! - **Phase folding**: fold a lightcurve at a trial period and epoch
//! - **Object selection**: browse crossmatched objects by classification
//! - **Data loading**: CSV tables (polars), in-memory fixtures, or PostgreSQL
//!
//! ## Architecture
//!
//! - [`models`]: value types (observations, series, periodograms, catalogue entries)
//! - [`algorithms`]: periodogram, detrending, phase folding
//! - [`selector`]: partition of the catalogue by class
//! - [`db`]: repository traits and backends
//! - [`services`]: the explorer session
//! - [`config`]: TOML and environment configuration
//!
//! ## Example
//!
//! ```ignore
//! use ngts_explorer::algorithms::PeriodogramConfig;
//! use ngts_explorer::config::ExplorerConfig;
//! use ngts_explorer::services::ExplorerSession;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = ExplorerSession::from_config(&ExplorerConfig::load(None)?).await?;
//!     let selection = session.select_object("EB", 0).await?;
//!     let config = PeriodogramConfig::default().with_period_range(0.1, 1.0);
//!     let power = session.find_period(&selection, &config)?;
//!     println!("{}: P = {:.5} d", selection.title(), power.peak_period());
//!     Ok(())
//! }
//! ```

// RepositoryError carries an ErrorContext for debugging
#![allow(clippy::result_large_err)]

pub mod algorithms;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod selector;
pub mod services;

pub use algorithms::{estimate_period, fold, PeriodogramConfig, PhaseOptions, PhasedSeries};
pub use error::{EstimatorError, ExplorerError, ExplorerResult, SelectionError};
pub use models::{ObjectClassEntry, Observation, PowerSeries, TimeSeries};
pub use selector::ObjectSelector;
