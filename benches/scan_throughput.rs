/// Scanner throughput benchmarks
///
/// Measures a full scan of one metric series across series lengths and
/// bucket counts, with a sustained shift in the last week.
use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use histalert::regression::{scan, DetectorConfig};
use histalert::series::DailySeries;
use std::time::Duration;

/// Bell-shaped histogram, optionally shifted to the right
fn synthetic_histogram(buckets: usize, shifted: bool) -> Vec<f64> {
    let center = if shifted {
        buckets as f64 * 0.7
    } else {
        buckets as f64 * 0.4
    };
    let width = (buckets as f64 / 8.0).max(1.0);
    (0..buckets)
        .map(|i| {
            let z = (i as f64 - center) / width;
            (50_000.0 * (-0.5 * z * z).exp()).round()
        })
        .collect()
}

fn synthetic_series(days: u64, buckets: usize) -> DailySeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    (0..days)
        .map(|i| {
            let shifted = i + 7 >= days;
            (start + Days::new(i), synthetic_histogram(buckets, shifted))
        })
        .collect()
}

/// Benchmark: scan length scaling with a fixed bucket count
fn bench_series_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_series_length");
    group.measurement_time(Duration::from_secs(5));
    let config = DetectorConfig::default();

    for days in [30u64, 90, 365].iter() {
        let series = synthetic_series(*days, 50);
        group.throughput(Throughput::Elements(*days));
        group.bench_with_input(BenchmarkId::from_parameter(days), &series, |b, series| {
            b.iter(|| black_box(scan(series, "BENCH", &[], &config)));
        });
    }

    group.finish();
}

/// Benchmark: scan cost against bucket count
fn bench_bucket_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_bucket_count");
    group.measurement_time(Duration::from_secs(5));
    let config = DetectorConfig::default();

    for buckets in [20usize, 100, 500].iter() {
        let series = synthetic_series(90, *buckets);
        group.bench_with_input(BenchmarkId::from_parameter(buckets), &series, |b, series| {
            b.iter(|| black_box(scan(series, "BENCH", &[], &config)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_series_length, bench_bucket_count);
criterion_main!(benches);
