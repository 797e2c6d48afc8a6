//! Numerical routines: periodogram, detrending, phase folding.
//!
//! Everything here works on [`TimeSeries`](crate::models::TimeSeries) values
//! and returns new values. Nothing here touches storage.

pub mod detrend;
pub mod periodogram;
pub mod phase;
pub mod stats;

pub use detrend::{fit_line, flux_to_magnitude, remove_airmass_trend, remove_linear_trend, LinearFit};
pub use periodogram::{estimate_period, FrequencyGrid, PeriodogramConfig};
pub use phase::{fold, PhaseOptions, PhasedSeries};
