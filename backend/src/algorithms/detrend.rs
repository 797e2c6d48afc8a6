//! Systematic-trend removal and flux/magnitude conversion.
//!
//! Ground-based photometry picks up a brightness trend with airmass. The
//! model removed here is a straight line in the covariate, fitted by weighted
//! least squares.

use log::debug;

use super::stats;
use crate::models::{Observation, TimeSeries};

/// Magnitude error factor: 2.5 / ln(10).
const MAGNITUDE_ERROR_FACTOR: f64 = 1.08;

/// `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn evaluate(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Weighted least-squares line through `(x, y)`.
///
/// `weights` default to uniform. Returns `None` when the slices are empty or
/// of different lengths, or when `x` has no spread.
pub fn fit_line(x: &[f64], y: &[f64], weights: Option<&[f64]>) -> Option<LinearFit> {
    if x.is_empty() || x.len() != y.len() || weights.is_some_and(|w| w.len() != x.len()) {
        return None;
    }

    let uniform;
    let w = match weights {
        Some(w) => w,
        None => {
            uniform = vec![1.0; x.len()];
            &uniform
        }
    };

    let total: f64 = w.iter().sum();
    if !(total > 0.0) {
        return None;
    }
    let x_mean = x.iter().zip(w).map(|(x, w)| x * w).sum::<f64>() / total;
    let y_mean = y.iter().zip(w).map(|(y, w)| y * w).sum::<f64>() / total;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for ((xi, yi), wi) in x.iter().zip(y).zip(w) {
        let dx = xi - x_mean;
        sxx += wi * dx * dx;
        sxy += wi * dx * (yi - y_mean);
    }

    if !(sxx > f64::EPSILON * total * (x_mean * x_mean).max(f64::MIN_POSITIVE)) {
        return None;
    }

    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}

/// Residuals of `values` after subtracting the best-fit line in `covariate`.
///
/// A covariate without spread cannot be separated from a constant offset, so
/// the residuals are then taken about the weighted mean.
pub fn remove_linear_trend(values: &[f64], covariate: &[f64], weights: Option<&[f64]>) -> Vec<f64> {
    match fit_line(covariate, values, weights) {
        Some(fit) => {
            debug!(
                "Linear trend: slope={:.6} intercept={:.6}",
                fit.slope, fit.intercept
            );
            values
                .iter()
                .zip(covariate)
                .map(|(v, c)| v - fit.evaluate(*c))
                .collect()
        }
        None => {
            let mean = match weights {
                Some(w) => {
                    let total: f64 = w.iter().sum();
                    values.iter().zip(w).map(|(v, w)| v * w).sum::<f64>() / total
                }
                None => values.iter().sum::<f64>() / values.len().max(1) as f64,
            };
            values.iter().map(|v| v - mean).collect()
        }
    }
}

/// Flux (and its error) as instrumental magnitude `-2.5 log10(flux)`.
///
/// Non-positive flux has no magnitude and yields NaN.
pub fn flux_to_magnitude(flux: f64, fluxerr: Option<f64>) -> (f64, Option<f64>) {
    if !(flux > 0.0) {
        return (f64::NAN, fluxerr.map(|_| f64::NAN));
    }
    let mag = -2.5 * flux.log10();
    let magerr = fluxerr.map(|e| MAGNITUDE_ERROR_FACTOR * e / flux);
    (mag, magerr)
}

/// Copy of `series` with the airmass trend removed from its valid samples.
///
/// Weights are inverse-variance when uncertainties are available. Returns
/// `None` when any valid sample lacks an airmass.
pub fn remove_airmass_trend(series: &TimeSeries) -> Option<TimeSeries> {
    if !series.has_airmass() {
        return None;
    }

    let valid: Vec<&Observation> = series.valid().collect();
    let values: Vec<f64> = valid.iter().map(|o| o.value).collect();
    let airmass: Vec<f64> = valid.iter().filter_map(|o| o.airmass).collect();
    let uncertainties: Vec<Option<f64>> = valid.iter().map(|o| o.uncertainty).collect();
    let weights = stats::normalised_weights(&uncertainties);

    let mut residuals = remove_linear_trend(&values, &airmass, Some(&weights)).into_iter();

    let observations = series
        .observations()
        .iter()
        .map(|o| {
            if o.is_valid() {
                Observation {
                    value: residuals.next().unwrap_or(f64::NAN),
                    ..*o
                }
            } else {
                *o
            }
        })
        .collect();

    Some(TimeSeries::new(observations))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_line_exact() {
        let x = [1.0, 1.5, 2.0, 2.5];
        let y: Vec<f64> = x.iter().map(|x| 0.3 * x - 1.0).collect();
        let fit = fit_line(&x, &y, None).unwrap();
        assert!((fit.slope - 0.3).abs() < 1e-12);
        assert!((fit.intercept + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_line_weighted_ignores_zero_weight_outlier() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 100.0];
        let w = [1.0, 1.0, 1.0, 0.0];
        let fit = fit_line(&x, &y, Some(&w)).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!(fit.intercept.abs() < 1e-12);
    }

    #[test]
    fn test_fit_line_rejects_degenerate_input() {
        assert!(fit_line(&[1.2, 1.2, 1.2], &[1.0, 2.0, 3.0], None).is_none());
        assert!(fit_line(&[], &[], None).is_none());
        assert!(fit_line(&[1.0, 2.0], &[1.0], None).is_none());
    }

    #[test]
    fn test_remove_linear_trend_flat_covariate_centres_values() {
        let residuals = remove_linear_trend(&[1.0, 3.0], &[1.1, 1.1], None);
        assert_eq!(residuals, vec![-1.0, 1.0]);
    }

    #[test]
    fn test_flux_to_magnitude() {
        let (mag, err) = flux_to_magnitude(1000.0, Some(10.0));
        assert!((mag + 7.5).abs() < 1e-12);
        assert!((err.unwrap() - 0.0108).abs() < 1e-12);

        let (mag, err) = flux_to_magnitude(0.0, None);
        assert!(mag.is_nan());
        assert!(err.is_none());
    }

    #[test]
    fn test_remove_airmass_trend() {
        let series: TimeSeries = (0..40)
            .map(|i| {
                let airmass = 1.0 + 0.02 * i as f64;
                Observation::new(i as f64, 10.0 + 0.5 * airmass).with_airmass(airmass)
            })
            .chain(std::iter::once(Observation::new(41.0, f64::NAN)))
            .collect();

        let detrended = remove_airmass_trend(&series).unwrap();
        assert_eq!(detrended.len(), series.len());
        for o in detrended.valid() {
            assert!(o.value.abs() < 1e-9);
        }
        assert!(detrended.observations()[40].value.is_nan());
    }

    #[test]
    fn test_remove_airmass_trend_without_airmass() {
        let series: TimeSeries = (0..5).map(|i| Observation::new(i as f64, 1.0)).collect();
        assert!(remove_airmass_trend(&series).is_none());
    }
}
