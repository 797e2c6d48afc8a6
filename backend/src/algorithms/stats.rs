//! Small weighted statistics shared by the detrending and periodogram code.

/// Median of a slice, reordering it in place. `None` when empty.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let n = values.len();
    Some(if n % 2 == 0 {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    } else {
        values[n / 2]
    })
}

/// Weights normalised to sum to one.
///
/// Inverse-variance weights when every sample has an uncertainty, uniform
/// weights otherwise.
pub fn normalised_weights(uncertainties: &[Option<f64>]) -> Vec<f64> {
    let n = uncertainties.len();
    if n == 0 {
        return Vec::new();
    }

    let raw: Option<Vec<f64>> = uncertainties
        .iter()
        .map(|s| s.map(|s| 1.0 / (s * s)))
        .collect();

    match raw {
        Some(raw) if raw.iter().all(|w| w.is_finite()) => {
            let total: f64 = raw.iter().sum();
            raw.into_iter().map(|w| w / total).collect()
        }
        _ => vec![1.0 / n as f64; n],
    }
}

/// Weighted mean for weights that sum to one.
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> f64 {
    values.iter().zip(weights).map(|(v, w)| v * w).sum()
}

/// Weighted variance about the weighted mean, for weights that sum to one.
pub fn weighted_variance(values: &[f64], weights: &[f64]) -> f64 {
    let mean = weighted_mean(values, weights);
    values
        .iter()
        .zip(weights)
        .map(|(v, w)| {
            let d = v - mean;
            w * d * d
        })
        .sum()
}

/// Largest absolute value, zero when empty.
pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
}

/// Whether every value is identical.
pub fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Whether a variance is indistinguishable from rounding error on numbers of
/// magnitude `scale`.
pub fn is_negligible_variance(variance: f64, scale: f64) -> bool {
    let tolerance = 64.0 * f64::EPSILON * scale.abs();
    !(variance > tolerance * tolerance)
}
