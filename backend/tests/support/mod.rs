#![allow(dead_code)]

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ngts_explorer::models::{Observation, TimeSeries};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Sinusoidal flux around 1000 on an irregular cadence starting at MJD 57000.
///
/// Samples come in nightly blocks so the sampling has realistic gaps.
pub fn sinusoid(period: f64, amplitude: f64, n: usize) -> TimeSeries {
    (0..n)
        .map(|i| {
            let night = (i / 40) as f64;
            let t = 57000.0 + night + 0.01 * (i % 40) as f64 + 0.002 * ((i * 7919) % 11) as f64;
            let flux = 1000.0 + amplitude * (2.0 * std::f64::consts::PI * t / period).sin();
            Observation::new(t, flux).with_uncertainty(2.0)
        })
        .collect()
}

/// Like [`sinusoid`], plus an airmass that rises through each night and a
/// flux loss proportional to it.
pub fn sinusoid_with_airmass(period: f64, amplitude: f64, n: usize) -> TimeSeries {
    sinusoid(period, amplitude, n)
        .observations()
        .iter()
        .map(|o| {
            let airmass = 1.0 + 0.8 * (o.time.fract() * 2.5).min(1.0);
            Observation {
                value: o.value * (1.0 - 0.05 * (airmass - 1.0)),
                airmass: Some(airmass),
                ..*o
            }
        })
        .collect()
}

/// Write `content` to `name` inside `dir`.
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).expect("create fixture file");
    file.write_all(content.as_bytes()).expect("write fixture file");
    path
}
