use serde::{Deserialize, Serialize};

/// Offset between Julian Date and Modified Julian Date.
pub const MJD_OFFSET: f64 = 2_400_000.5;

/// Modified Julian Date representation.
/// MJD 0 = 1858-11-17 00:00:00 UTC
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModifiedJulianDate(f64);

impl ModifiedJulianDate {
    pub fn new(v: f64) -> Self {
        Self(v)
    }

    /// Raw MJD value as f64.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Build from a full Julian Date.
    pub fn from_jd(jd: f64) -> Self {
        Self(jd - MJD_OFFSET)
    }

    /// Full Julian Date.
    pub fn to_jd(&self) -> f64 {
        self.0 + MJD_OFFSET
    }

    /// Whole-day floor, used as the origin of relative time axes.
    pub fn day_floor(&self) -> i64 {
        self.0.floor() as i64
    }

    /// Convert to Unix timestamp (seconds since 1970-01-01 00:00:00 UTC).
    pub fn to_unix_timestamp(&self) -> f64 {
        (self.0 - 40587.0) * 86400.0
    }

    /// Convert to chrono DateTime<Utc>.
    pub fn to_datetime(&self) -> chrono::DateTime<chrono::Utc> {
        let secs = self.to_unix_timestamp();
        let secs_i64 = secs.floor() as i64;
        let nanos = ((secs - secs.floor()) * 1e9) as u32;
        chrono::DateTime::from_timestamp(secs_i64, nanos).unwrap_or(chrono::DateTime::UNIX_EPOCH)
    }
}

impl From<f64> for ModifiedJulianDate {
    fn from(v: f64) -> Self {
        ModifiedJulianDate::new(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_jd_roundtrip() {
        let mjd = ModifiedJulianDate::from_jd(2_457_000.5);
        assert_eq!(mjd.value(), 57000.0);
        assert_eq!(mjd.to_jd(), 2_457_000.5);
    }

    #[test]
    fn test_day_floor() {
        assert_eq!(ModifiedJulianDate::new(57123.75).day_floor(), 57123);
        assert_eq!(ModifiedJulianDate::new(-0.5).day_floor(), -1);
    }

    #[test]
    fn test_unix_epoch() {
        let mjd = ModifiedJulianDate::new(40587.0);
        assert!(mjd.to_unix_timestamp().abs() < 1e-6);
        assert_eq!(mjd.to_datetime().year(), 1970);
    }

    #[test]
    fn test_to_datetime() {
        let dt = ModifiedJulianDate::new(57388.25).to_datetime();
        assert_eq!(dt.to_rfc3339(), "2016-01-01T06:00:00+00:00");
    }

    #[test]
    fn test_ordering() {
        assert!(ModifiedJulianDate::new(57000.0) < ModifiedJulianDate::new(57000.1));
    }
}
