//! Phase folding at a trial period.

use serde::Serialize;

use crate::error::EstimatorError;
use crate::models::{ModifiedJulianDate, TimeSeries};

/// How to fold a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseOptions {
    /// Reference time of phase zero (MJD).
    pub epoch: f64,
    /// Repeat the folded curve over `[1, 2)` so features at phase 0 read continuously.
    pub double: bool,
}

impl Default for PhaseOptions {
    fn default() -> Self {
        Self {
            epoch: 0.0,
            double: true,
        }
    }
}

impl PhaseOptions {
    pub fn with_epoch(mut self, epoch: f64) -> Self {
        self.epoch = epoch;
        self
    }

    /// Epoch given as a Julian Date; stored as MJD.
    pub fn with_jd_epoch(mut self, jd: f64) -> Self {
        self.epoch = ModifiedJulianDate::from_jd(jd).value();
        self
    }

    pub fn with_double(mut self, double: bool) -> Self {
        self.double = double;
        self
    }
}

/// A lightcurve folded on a period, ordered by phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhasedSeries {
    pub period: f64,
    pub epoch: f64,
    pub phases: Vec<f64>,
    pub values: Vec<f64>,
    pub uncertainties: Vec<Option<f64>>,
}

impl PhasedSeries {
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

/// Fold the valid observations of `series` on `period`.
pub fn fold(
    series: &TimeSeries,
    period: f64,
    options: PhaseOptions,
) -> Result<PhasedSeries, EstimatorError> {
    if !(period.is_finite() && period > 0.0) {
        return Err(EstimatorError::invalid_config(format!(
            "fold period must be finite and positive, got {}",
            period
        )));
    }
    if !options.epoch.is_finite() {
        return Err(EstimatorError::invalid_config("fold epoch must be finite"));
    }

    let mut points: Vec<(f64, f64, Option<f64>)> = series
        .valid()
        .map(|o| {
            let phase = ((o.time - options.epoch) / period).rem_euclid(1.0);
            // rem_euclid can round up to exactly 1.0 for tiny negative inputs
            let phase = if phase >= 1.0 { 0.0 } else { phase };
            (phase, o.value, o.uncertainty)
        })
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    if options.double {
        let shifted: Vec<_> = points.iter().map(|&(p, v, e)| (p + 1.0, v, e)).collect();
        points.extend(shifted);
    }

    Ok(PhasedSeries {
        period,
        epoch: options.epoch,
        phases: points.iter().map(|p| p.0).collect(),
        values: points.iter().map(|p| p.1).collect(),
        uncertainties: points.iter().map(|p| p.2).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;

    fn ramp() -> TimeSeries {
        (0..10)
            .map(|i| Observation::new(57000.0 + i as f64 * 0.35, i as f64))
            .chain(std::iter::once(Observation::new(57001.0, f64::NAN)))
            .collect()
    }

    #[test]
    fn test_fold_phases_in_unit_interval_sorted() {
        let folded = fold(&ramp(), 1.0, PhaseOptions::default().with_double(false)).unwrap();
        assert_eq!(folded.len(), 10);
        assert!(folded.phases.iter().all(|p| (0.0..1.0).contains(p)));
        assert!(folded.phases.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_fold_double_covers_two_cycles() {
        let folded = fold(&ramp(), 1.0, PhaseOptions::default()).unwrap();
        assert_eq!(folded.len(), 20);
        assert!(folded.phases[..10].iter().all(|p| *p < 1.0));
        assert!(folded.phases[10..].iter().all(|p| (1.0..2.0).contains(p)));
        assert_eq!(folded.values[..10], folded.values[10..]);
    }

    #[test]
    fn test_fold_epoch_sets_phase_zero() {
        let series: TimeSeries = vec![Observation::new(57010.25, 1.0)].into();
        let folded = fold(
            &series,
            0.5,
            PhaseOptions::default().with_epoch(57000.0).with_double(false),
        )
        .unwrap();
        assert!((folded.phases[0] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_jd_epoch_matches_mjd_epoch() {
        let series = ramp();
        let from_mjd = fold(&series, 0.8, PhaseOptions::default().with_epoch(57000.1)).unwrap();
        let from_jd = fold(
            &series,
            0.8,
            PhaseOptions::default().with_jd_epoch(2_457_000.6),
        )
        .unwrap();
        for (a, b) in from_mjd.phases.iter().zip(&from_jd.phases) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_fold_rejects_bad_period() {
        assert!(fold(&ramp(), 0.0, PhaseOptions::default()).is_err());
        assert!(fold(&ramp(), f64::NAN, PhaseOptions::default()).is_err());
        assert!(fold(&ramp(), 1.0, PhaseOptions::default().with_epoch(f64::INFINITY)).is_err());
    }
}
