//! Lomb-Scargle period estimation for irregularly sampled lightcurves.
//!
//! The periodogram is the generalised Lomb-Scargle form (Zechmeister &
//! Kürster 2009): at every trial frequency a sinusoid plus a constant offset
//! is fitted by weighted linear least squares, and the power is the fraction
//! of the weighted variance the sinusoid explains,
//!
//! ```text
//! p(f) = 1 - chi2(sinusoid + offset) / chi2(offset)
//! ```
//!
//! which lies in `[0, 1]` for every frequency and every series, so powers are
//! comparable across the grid and across objects.
//!
//! Grid points are independent. Each one reads the shared, immutable input
//! and writes only its own output slot, so serial and parallel evaluation
//! give bit-identical results.

use std::f64::consts::PI;

use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::detrend;
use super::stats;
use crate::error::{DegenerateReason, EstimatorError};
use crate::models::{EstimatorWarning, Observation, PowerSeries, TimeSeries};

fn default_n_frequencies() -> usize {
    1000
}

fn default_min_points() -> usize {
    2
}

fn default_low_confidence_points() -> usize {
    10
}

fn default_parallel() -> bool {
    true
}

/// Periodogram settings.
///
/// Period bounds left unset are derived from the data: the upper bound is
/// the time baseline and the lower bound twice the median sampling cadence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodogramConfig {
    /// Shortest trial period (days).
    #[serde(default)]
    pub min_period: Option<f64>,
    /// Longest trial period (days).
    #[serde(default)]
    pub max_period: Option<f64>,
    /// Number of grid points, uniform in frequency.
    #[serde(default = "default_n_frequencies")]
    pub n_frequencies: usize,
    /// Remove a linear airmass trend before the fit.
    #[serde(default)]
    pub detrend: bool,
    /// Fewer valid points than this is an error.
    #[serde(default = "default_min_points")]
    pub min_points: usize,
    /// Fewer valid points than this gives a low-confidence warning.
    #[serde(default = "default_low_confidence_points")]
    pub low_confidence_points: usize,
    /// Evaluate grid points on the rayon thread pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for PeriodogramConfig {
    fn default() -> Self {
        Self {
            min_period: None,
            max_period: None,
            n_frequencies: default_n_frequencies(),
            detrend: false,
            min_points: default_min_points(),
            low_confidence_points: default_low_confidence_points(),
            parallel: default_parallel(),
        }
    }
}

impl PeriodogramConfig {
    pub fn with_period_range(mut self, min_period: f64, max_period: f64) -> Self {
        self.min_period = Some(min_period);
        self.max_period = Some(max_period);
        self
    }

    pub fn with_min_period(mut self, min_period: f64) -> Self {
        self.min_period = Some(min_period);
        self
    }

    pub fn with_max_period(mut self, max_period: f64) -> Self {
        self.max_period = Some(max_period);
        self
    }

    pub fn with_n_frequencies(mut self, n_frequencies: usize) -> Self {
        self.n_frequencies = n_frequencies;
        self
    }

    pub fn with_detrend(mut self, detrend: bool) -> Self {
        self.detrend = detrend;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Checks that do not depend on the data.
    pub fn validate(&self) -> Result<(), EstimatorError> {
        if self.n_frequencies == 0 {
            return Err(EstimatorError::invalid_config(
                "n_frequencies must be positive",
            ));
        }
        if self.min_points == 0 {
            return Err(EstimatorError::invalid_config("min_points must be positive"));
        }
        for (name, bound) in [("min_period", self.min_period), ("max_period", self.max_period)] {
            if let Some(p) = bound {
                if !(p.is_finite() && p > 0.0) {
                    return Err(EstimatorError::invalid_config(format!(
                        "{} must be finite and positive, got {}",
                        name, p
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_period, self.max_period) {
            if min >= max {
                return Err(EstimatorError::invalid_config(format!(
                    "min_period ({}) must be less than max_period ({})",
                    min, max
                )));
            }
        }
        Ok(())
    }
}

/// Trial frequencies, ascending and uniform, spanning `[1/max, 1/min]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyGrid {
    min_period: f64,
    max_period: f64,
    frequencies: Vec<f64>,
}

impl FrequencyGrid {
    /// A single-point grid holds only `1/max_period`.
    pub fn new(min_period: f64, max_period: f64, n: usize) -> Self {
        let f_lo = 1.0 / max_period;
        let f_hi = 1.0 / min_period;
        let frequencies = match n {
            0 => Vec::new(),
            1 => vec![f_lo],
            _ => {
                let step = (f_hi - f_lo) / (n - 1) as f64;
                (0..n)
                    .map(|k| if k == n - 1 { f_hi } else { f_lo + step * k as f64 })
                    .collect()
            }
        };
        Self {
            min_period,
            max_period,
            frequencies,
        }
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Periods in ascending order, held inside the grid's period range.
    pub fn periods(&self) -> Vec<f64> {
        self.frequencies
            .iter()
            .rev()
            .map(|f| (1.0 / f).clamp(self.min_period, self.max_period))
            .collect()
    }
}

/// Prepared samples shared read-only by every grid point.
struct GlsKernel {
    times: Vec<f64>,
    residuals: Vec<f64>,
    weights: Vec<f64>,
    /// Weighted sum of squared residuals about the mean (chi2 of the offset model).
    yy: f64,
}

impl GlsKernel {
    fn new(times: &[f64], values: &[f64], weights: &[f64]) -> Self {
        // Shift the time origin to keep the phase arguments small
        let t0 = times.first().copied().unwrap_or(0.0);
        let mean = stats::weighted_mean(values, weights);
        let residuals: Vec<f64> = values.iter().map(|v| v - mean).collect();
        let yy: f64 = residuals
            .iter()
            .zip(weights)
            .map(|(r, w)| w * r * r)
            .sum();

        Self {
            times: times.iter().map(|t| t - t0).collect(),
            residuals,
            weights: weights.to_vec(),
            yy,
        }
    }

    fn power(&self, frequency: f64) -> f64 {
        let omega = 2.0 * PI * frequency;

        let (mut c, mut s) = (0.0, 0.0);
        let (mut yc, mut ys) = (0.0, 0.0);
        let (mut cc, mut ss, mut cs) = (0.0, 0.0, 0.0);
        for ((t, y), w) in self.times.iter().zip(&self.residuals).zip(&self.weights) {
            let (sin, cos) = (omega * t).sin_cos();
            c += w * cos;
            s += w * sin;
            yc += w * y * cos;
            ys += w * y * sin;
            cc += w * cos * cos;
            ss += w * sin * sin;
            cs += w * cos * sin;
        }

        // Residuals have zero weighted mean, so Y = 0 in the centred sums
        let cc = cc - c * c;
        let ss = ss - s * s;
        let cs = cs - c * s;
        let d = cc * ss - cs * cs;

        if !(d > f64::EPSILON * cc.abs().max(ss.abs()).max(f64::MIN_POSITIVE)) {
            // Sampling cannot tell sine from cosine at this frequency
            return 0.0;
        }

        let p = (ss * yc * yc + cc * ys * ys - 2.0 * cs * yc * ys) / (self.yy * d);
        if p.is_finite() {
            p.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Estimate the dominant period of `series`.
///
/// Invalid observations are dropped and counted in the result's warnings.
/// The input is never modified; every call builds a new [`PowerSeries`].
///
/// # Errors
///
/// * [`EstimatorError::InvalidConfig`] for contradictory or out-of-range settings
/// * [`EstimatorError::InsufficientData`] when fewer than `min_points` survive filtering
/// * [`EstimatorError::DegenerateInput`] for a zero baseline or zero variance
pub fn estimate_period(
    series: &TimeSeries,
    config: &PeriodogramConfig,
) -> Result<PowerSeries, EstimatorError> {
    config.validate()?;

    let mut warnings = Vec::new();

    let valid: Vec<&Observation> = series.valid().collect();
    let dropped = series.len() - valid.len();
    if dropped > 0 {
        warn!("Dropped {} non-finite observations before period search", dropped);
        warnings.push(EstimatorWarning::DroppedNonFinite { count: dropped });
    }

    if valid.len() < config.min_points {
        return Err(EstimatorError::InsufficientData {
            valid: valid.len(),
            required: config.min_points,
        });
    }
    if valid.len() < config.low_confidence_points {
        warn!(
            "Only {} valid observations, periodogram is low confidence",
            valid.len()
        );
        warnings.push(EstimatorWarning::LowPointCount {
            valid: valid.len(),
            recommended: config.low_confidence_points,
        });
    }

    let baseline = series.baseline().unwrap_or(0.0);
    if !(baseline > 0.0) {
        return Err(EstimatorError::degenerate(DegenerateReason::ZeroBaseline));
    }

    let times: Vec<f64> = valid.iter().map(|o| o.time).collect();
    let mut values: Vec<f64> = valid.iter().map(|o| o.value).collect();
    let uncertainties: Vec<Option<f64>> = valid.iter().map(|o| o.uncertainty).collect();
    let weights = stats::normalised_weights(&uncertainties);

    if stats::is_constant(&values) || !(stats::weighted_variance(&values, &weights) > 0.0) {
        return Err(EstimatorError::degenerate(DegenerateReason::ZeroVariance));
    }

    if config.detrend {
        if series.has_airmass() {
            let airmass: Vec<f64> = valid.iter().filter_map(|o| o.airmass).collect();
            let scale = stats::max_abs(&values);
            values = detrend::remove_linear_trend(&values, &airmass, Some(&weights));
            // Residuals of an exact airmass trend are rounding noise
            if stats::is_negligible_variance(stats::weighted_variance(&values, &weights), scale) {
                return Err(EstimatorError::degenerate(DegenerateReason::ZeroVariance));
            }
        } else {
            warn!("Detrending requested but no airmass available, skipping");
            warnings.push(EstimatorWarning::DetrendSkipped);
        }
    }

    let cadence = series.median_cadence().unwrap_or(baseline);
    let (min_period, max_period) = resolve_period_range(config, baseline, cadence, &mut warnings)?;

    let grid = FrequencyGrid::new(min_period, max_period, config.n_frequencies);
    debug!(
        "Periodogram: {} points, periods [{:.6}, {:.6}], {} frequencies",
        valid.len(),
        min_period,
        max_period,
        grid.len()
    );

    let kernel = GlsKernel::new(&times, &values, &weights);
    let mut power: Vec<f64> = if config.parallel {
        grid.frequencies()
            .par_iter()
            .map(|&f| kernel.power(f))
            .collect()
    } else {
        grid.frequencies().iter().map(|&f| kernel.power(f)).collect()
    };
    // Ascending period is descending frequency
    power.reverse();

    let result = PowerSeries::new(grid.periods(), power, valid.len(), warnings);
    debug!(
        "Peak period {:.6} with power {:.4}",
        result.peak_period(),
        result.peak_power()
    );
    Ok(result)
}

/// Fill unset bounds from the data.
///
/// An explicit lower bound that does not fit under the baseline is a
/// configuration error. A derived lower bound that does not fit falls back
/// to half the upper bound.
fn resolve_period_range(
    config: &PeriodogramConfig,
    baseline: f64,
    cadence: f64,
    warnings: &mut Vec<EstimatorWarning>,
) -> Result<(f64, f64), EstimatorError> {
    let max_period = config.max_period.unwrap_or(baseline);

    let min_period = match config.min_period {
        Some(min) => {
            if min >= max_period {
                return Err(EstimatorError::invalid_config(format!(
                    "min_period ({}) must be less than the data baseline ({})",
                    min, max_period
                )));
            }
            min
        }
        None => {
            let derived = 2.0 * cadence;
            if derived < max_period {
                derived
            } else {
                let fallback = max_period / 2.0;
                warn!(
                    "Cadence-derived min_period {} exceeds max_period {}, using {}",
                    derived, max_period, fallback
                );
                warnings.push(EstimatorWarning::DerivedRangeCollapsed {
                    min_period: fallback,
                    max_period,
                });
                fallback
            }
        }
    };

    Ok((min_period, max_period))
}
