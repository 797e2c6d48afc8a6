use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ngts_explorer::algorithms::{estimate_period, fold, PeriodogramConfig, PhaseOptions};
use ngts_explorer::models::{Observation, TimeSeries};

fn synthetic_series(n: usize) -> TimeSeries {
    (0..n)
        .map(|i| {
            let t = 57000.0 + i as f64 * 0.0087 + (i / 500) as f64 * 0.6;
            let flux = 1000.0 + 40.0 * (2.0 * std::f64::consts::PI * t / 0.437).sin();
            Observation::new(t, flux)
                .with_uncertainty(3.0)
                .with_airmass(1.0 + 0.3 * ((i % 500) as f64 / 500.0))
        })
        .collect()
}

fn bench_periodogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("periodogram");
    group.sample_size(20);

    let series = synthetic_series(2000);
    for n_freq in [1_000usize, 10_000] {
        let serial = PeriodogramConfig::default()
            .with_period_range(0.1, 5.0)
            .with_n_frequencies(n_freq)
            .with_parallel(false);
        group.bench_with_input(BenchmarkId::new("serial", n_freq), &serial, |b, config| {
            b.iter(|| estimate_period(black_box(&series), config));
        });

        let parallel = serial.clone().with_parallel(true);
        group.bench_with_input(
            BenchmarkId::new("parallel", n_freq),
            &parallel,
            |b, config| {
                b.iter(|| estimate_period(black_box(&series), config));
            },
        );
    }

    group.finish();
}

fn bench_detrended_periodogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("periodogram_detrend");
    group.sample_size(20);

    let series = synthetic_series(2000);
    let config = PeriodogramConfig::default()
        .with_period_range(0.1, 5.0)
        .with_n_frequencies(5_000)
        .with_detrend(true);
    group.bench_function("detrend_5000", |b| {
        b.iter(|| estimate_period(black_box(&series), &config));
    });

    group.finish();
}

fn bench_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("phase_fold");

    for n in [1_000usize, 10_000] {
        let series = synthetic_series(n);
        group.bench_with_input(BenchmarkId::new("double", n), &series, |b, series| {
            b.iter(|| fold(black_box(series), 0.437, PhaseOptions::default()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_periodogram,
    bench_detrended_periodogram,
    bench_fold
);
criterion_main!(benches);
