//! Lightcurve samples and the time series that owns them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::time::ModifiedJulianDate;
use crate::algorithms::detrend;
use crate::algorithms::stats;

/// A single photometric measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Mid-exposure time (MJD).
    pub time: f64,
    /// Flux or magnitude.
    pub value: f64,
    #[serde(default)]
    pub uncertainty: Option<f64>,
    /// Airmass of the exposure, the usual covariate for detrending.
    #[serde(default)]
    pub airmass: Option<f64>,
}

impl Observation {
    pub fn new(time: f64, value: f64) -> Self {
        Self {
            time,
            value,
            uncertainty: None,
            airmass: None,
        }
    }

    pub fn with_uncertainty(mut self, uncertainty: f64) -> Self {
        self.uncertainty = Some(uncertainty);
        self
    }

    pub fn with_airmass(mut self, airmass: f64) -> Self {
        self.airmass = Some(airmass);
        self
    }

    /// Finite time and value, and an uncertainty that is either absent or
    /// finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.time.is_finite()
            && self.value.is_finite()
            && self.uncertainty.map_or(true, |s| s.is_finite() && s > 0.0)
    }

    fn has_airmass(&self) -> bool {
        self.airmass.is_some_and(f64::is_finite)
    }
}

/// Observations of one object, ordered by time.
///
/// Construction sorts the samples; nothing else reorders or edits them.
/// Invalid samples are kept so callers can see what was recorded, and are
/// filtered out by every analysis that consumes the series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Observation>", into = "Vec<Observation>")]
pub struct TimeSeries {
    observations: Vec<Observation>,
}

impl From<Vec<Observation>> for TimeSeries {
    fn from(observations: Vec<Observation>) -> Self {
        TimeSeries::new(observations)
    }
}

impl From<TimeSeries> for Vec<Observation> {
    fn from(series: TimeSeries) -> Self {
        series.observations
    }
}

impl FromIterator<Observation> for TimeSeries {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        TimeSeries::new(iter.into_iter().collect())
    }
}

impl TimeSeries {
    /// Stable sort by time; NaN timestamps sort last.
    pub fn new(mut observations: Vec<Observation>) -> Self {
        observations.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { observations }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Valid observations in time order.
    pub fn valid(&self) -> impl Iterator<Item = &Observation> + '_ {
        self.observations.iter().filter(|o| o.is_valid())
    }

    pub fn valid_count(&self) -> usize {
        self.valid().count()
    }

    pub fn invalid_count(&self) -> usize {
        self.len() - self.valid_count()
    }

    /// Span between the first and last valid timestamps.
    pub fn baseline(&self) -> Option<f64> {
        let mut valid = self.valid();
        let first = valid.next()?.time;
        let last = valid.last().map_or(first, |o| o.time);
        Some(last - first)
    }

    /// Median spacing between consecutive distinct valid timestamps.
    pub fn median_cadence(&self) -> Option<f64> {
        let times: Vec<f64> = self.valid().map(|o| o.time).collect();
        let mut gaps: Vec<f64> = times
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|gap| *gap > 0.0)
            .collect();
        stats::median(&mut gaps)
    }

    /// Whole-day MJD preceding the first valid sample, for relative time axes.
    pub fn time_origin(&self) -> Option<ModifiedJulianDate> {
        self.valid()
            .next()
            .map(|o| ModifiedJulianDate::new(o.time.floor()))
    }

    /// UTC dates of the first and last valid samples.
    pub fn date_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let mut valid = self.valid();
        let first = valid.next()?.time;
        let last = valid.last().map_or(first, |o| o.time);
        Some((
            ModifiedJulianDate::new(first).to_datetime(),
            ModifiedJulianDate::new(last).to_datetime(),
        ))
    }

    /// Axis label for times relative to [`time_origin`](Self::time_origin).
    pub fn time_label(&self) -> String {
        match self.time_origin() {
            Some(origin) => format!("MJD - {}", origin.day_floor()),
            None => "MJD".to_string(),
        }
    }

    /// True when every valid observation carries a finite airmass.
    pub fn has_airmass(&self) -> bool {
        let mut valid = self.valid().peekable();
        valid.peek().is_some() && valid.all(|o| o.has_airmass())
    }

    /// Series converted from flux to instrumental magnitudes.
    ///
    /// Non-positive fluxes become NaN and are therefore filtered downstream.
    pub fn to_magnitudes(&self) -> TimeSeries {
        self.observations
            .iter()
            .map(|o| {
                let (mag, magerr) = detrend::flux_to_magnitude(o.value, o.uncertainty);
                Observation {
                    value: mag,
                    uncertainty: magerr,
                    ..*o
                }
            })
            .collect()
    }

    /// Instrumental magnitudes with the linear airmass trend removed.
    ///
    /// Without airmass the magnitudes are returned untouched.
    pub fn detrended_magnitudes(&self) -> TimeSeries {
        let mags = self.to_magnitudes();
        detrend::remove_airmass_trend(&mags).unwrap_or(mags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(points: &[(f64, f64)]) -> TimeSeries {
        points.iter().map(|&(t, v)| Observation::new(t, v)).collect()
    }

    #[test]
    fn test_new_sorts_by_time() {
        let ts = series(&[(3.0, 30.0), (1.0, 10.0), (2.0, 20.0)]);
        let times: Vec<f64> = ts.observations().iter().map(|o| o.time).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_nan_times_sort_last_and_are_invalid() {
        let ts = series(&[(f64::NAN, 1.0), (2.0, 2.0), (1.0, 1.0)]);
        assert!(ts.observations()[2].time.is_nan());
        assert_eq!(ts.valid_count(), 2);
        assert_eq!(ts.invalid_count(), 1);
    }

    #[test]
    fn test_observation_validity() {
        assert!(Observation::new(1.0, 2.0).is_valid());
        assert!(!Observation::new(1.0, f64::INFINITY).is_valid());
        assert!(!Observation::new(1.0, 2.0).with_uncertainty(0.0).is_valid());
        assert!(!Observation::new(1.0, 2.0).with_uncertainty(f64::NAN).is_valid());
        assert!(Observation::new(1.0, 2.0).with_uncertainty(0.1).is_valid());
        // A bad airmass does not invalidate the measurement itself
        assert!(Observation::new(1.0, 2.0).with_airmass(f64::NAN).is_valid());
    }

    #[test]
    fn test_baseline_and_cadence_ignore_invalid() {
        let ts = series(&[(0.0, 1.0), (0.5, f64::NAN), (1.0, 2.0), (3.0, 1.0), (4.0, 5.0)]);
        assert_eq!(ts.baseline(), Some(4.0));
        // gaps: 1, 2, 1
        assert_eq!(ts.median_cadence(), Some(1.0));
    }

    #[test]
    fn test_empty_series() {
        let ts = TimeSeries::default();
        assert!(ts.is_empty());
        assert_eq!(ts.baseline(), None);
        assert_eq!(ts.median_cadence(), None);
        assert_eq!(ts.time_label(), "MJD");
        assert!(!ts.has_airmass());
    }

    #[test]
    fn test_date_range_skips_invalid() {
        let ts = series(&[(57388.5, f64::NAN), (57388.25, 1.0), (57389.0, 2.0)]);
        let (first, last) = ts.date_range().unwrap();
        assert_eq!(first.to_rfc3339(), "2016-01-01T06:00:00+00:00");
        assert_eq!(last.to_rfc3339(), "2016-01-02T00:00:00+00:00");
        assert!(TimeSeries::default().date_range().is_none());
    }

    #[test]
    fn test_time_label() {
        let ts = series(&[(57001.7, 1.0), (57003.2, 2.0)]);
        assert_eq!(ts.time_label(), "MJD - 57001");
    }

    #[test]
    fn test_has_airmass_requires_every_valid_point() {
        let ts: TimeSeries = vec![
            Observation::new(0.0, 1.0).with_airmass(1.1),
            Observation::new(1.0, 1.0),
        ]
        .into();
        assert!(!ts.has_airmass());

        let ts: TimeSeries = vec![
            Observation::new(0.0, 1.0).with_airmass(1.1),
            Observation::new(1.0, 1.0).with_airmass(1.3),
            Observation::new(2.0, f64::NAN),
        ]
        .into();
        assert!(ts.has_airmass());
    }

    #[test]
    fn test_to_magnitudes() {
        let ts: TimeSeries = vec![
            Observation::new(0.0, 100.0).with_uncertainty(1.0),
            Observation::new(1.0, -5.0),
        ]
        .into();
        let mags = ts.to_magnitudes();
        let first = mags.observations()[0];
        assert!((first.value + 5.0).abs() < 1e-12);
        assert!((first.uncertainty.unwrap() - 0.0108).abs() < 1e-12);
        assert!(mags.observations()[1].value.is_nan());
        assert_eq!(mags.valid_count(), 1);
    }

    #[test]
    fn test_serde_roundtrip_sorts() {
        let json = r#"[{"time":2.0,"value":1.0},{"time":1.0,"value":3.0,"airmass":1.2}]"#;
        let ts: TimeSeries = serde_json::from_str(json).unwrap();
        assert_eq!(ts.observations()[0].time, 1.0);
        assert_eq!(ts.observations()[0].airmass, Some(1.2));
        assert_eq!(ts.observations()[1].uncertainty, None);
    }
}
