//! Periodogram results.

use std::fmt;

use serde::Serialize;

/// Non-fatal conditions noticed while estimating a period.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EstimatorWarning {
    /// Observations with non-finite time/value or unusable uncertainty.
    DroppedNonFinite { count: usize },
    /// Enough points to compute, too few to trust.
    LowPointCount { valid: usize, recommended: usize },
    /// Detrending was requested but the series carries no usable airmass.
    DetrendSkipped,
    /// The cadence-derived lower bound did not fit under the upper bound.
    DerivedRangeCollapsed { min_period: f64, max_period: f64 },
}

impl fmt::Display for EstimatorWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimatorWarning::DroppedNonFinite { count } => {
                write!(f, "dropped {} non-finite observations", count)
            }
            EstimatorWarning::LowPointCount { valid, recommended } => write!(
                f,
                "only {} valid observations (at least {} recommended), result is low confidence",
                valid, recommended
            ),
            EstimatorWarning::DetrendSkipped => {
                write!(f, "detrending skipped: no airmass available")
            }
            EstimatorWarning::DerivedRangeCollapsed {
                min_period,
                max_period,
            } => write!(
                f,
                "sampling cadence too coarse for baseline, scanning [{:.6}, {:.6}]",
                min_period, max_period
            ),
        }
    }
}

/// A periodogram: power against trial period, in ascending-period order.
///
/// Immutable once built; produced fresh by every estimation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerSeries {
    periods: Vec<f64>,
    power: Vec<f64>,
    peak_period: f64,
    peak_power: f64,
    valid_points: usize,
    warnings: Vec<EstimatorWarning>,
}

impl PowerSeries {
    /// Build from ascending periods and matching powers.
    ///
    /// Among equal maxima the longest period wins. Callers guarantee equal,
    /// non-zero lengths and finite powers.
    pub(crate) fn new(
        periods: Vec<f64>,
        power: Vec<f64>,
        valid_points: usize,
        warnings: Vec<EstimatorWarning>,
    ) -> Self {
        debug_assert_eq!(periods.len(), power.len());
        debug_assert!(!periods.is_empty());

        let mut peak = 0;
        for (i, p) in power.iter().enumerate() {
            if *p >= power[peak] {
                peak = i;
            }
        }

        Self {
            peak_period: periods[peak],
            peak_power: power[peak],
            periods,
            power,
            valid_points,
            warnings,
        }
    }

    /// Trial periods, ascending.
    pub fn periods(&self) -> &[f64] {
        &self.periods
    }

    pub fn power(&self) -> &[f64] {
        &self.power
    }

    /// Trial frequencies matching [`periods`](Self::periods) (descending).
    pub fn frequencies(&self) -> Vec<f64> {
        self.periods.iter().map(|p| 1.0 / p).collect()
    }

    pub fn peak_period(&self) -> f64 {
        self.peak_period
    }

    pub fn peak_power(&self) -> f64 {
        self.peak_power
    }

    /// Number of observations that went into the fit.
    pub fn valid_points(&self) -> usize {
        self.valid_points
    }

    pub fn warnings(&self) -> &[EstimatorWarning] {
        &self.warnings
    }

    pub fn is_low_confidence(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w, EstimatorWarning::LowPointCount { .. }))
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// `(period, power)` pairs, ascending period.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.periods.iter().copied().zip(self.power.iter().copied())
    }

    /// The `n` strongest local maxima as `(period, power)`, strongest first.
    pub fn top_peaks(&self, n: usize) -> Vec<(f64, f64)> {
        let len = self.power.len();
        let mut peaks: Vec<(f64, f64)> = (0..len)
            .filter(|&i| {
                let left = i == 0 || self.power[i] >= self.power[i - 1];
                let right = i + 1 == len || self.power[i] > self.power[i + 1];
                left && right
            })
            .map(|i| (self.periods[i], self.power[i]))
            .collect();
        peaks.sort_by(|a, b| b.1.total_cmp(&a.1).then(b.0.total_cmp(&a.0)));
        peaks.truncate(n);
        peaks
    }
}
