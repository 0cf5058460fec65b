//! Criterion benchmarks for the enrichment pipeline.
//!
//! Benchmarks:
//! 1. Single-instrument fetch (bare, with the classic bulk suite)
//! 2. Denoising methods over one close column
//! 3. Pivot levels at increasing level counts
//! 4. Multi-instrument aligned fetch

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use featurelab_core::backends::BackendKind;
use featurelab_core::data::SyntheticProvider;
use featurelab_core::domain::{Bar, FeatureFrame};
use featurelab_core::pipeline::{
    add_pivot_levels, denoise, fetch, CancelToken, DenoiseSpec, FetchRequest, PivotConfig,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_frame(n: usize) -> FeatureFrame {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let bars: Vec<Bar> = (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            Bar {
                time: start + chrono::Duration::hours(i as i64),
                open: close - 0.3,
                high: close + 1.5,
                low: close - 1.5,
                close,
                volume: 1_000.0 + (i % 500) as f64,
            }
        })
        .collect();
    FeatureFrame::from_bars(&bars)
}

// ── 1. Single-instrument fetch ───────────────────────────────────────

fn bench_fetch(c: &mut Criterion) {
    let mut group = c.benchmark_group("fetch_single");
    group.sample_size(20);

    for &count in &[500usize, 2_000, 5_000] {
        let provider = SyntheticProvider::new(42, count + 100);

        let bare = FetchRequest::new("SYN", "1h").with_count(count);
        group.bench_with_input(BenchmarkId::new("bare", count), &count, |b, _| {
            b.iter(|| fetch(&provider, black_box(&bare), &CancelToken::new()))
        });

        let mut suite = FetchRequest::new("SYN", "1h").with_count(count);
        suite.all_indicators = vec![BackendKind::Classic];
        suite.pivot_levels = 5;
        suite.meta_dates = true;
        group.bench_with_input(BenchmarkId::new("classic_suite", count), &count, |b, _| {
            b.iter(|| fetch(&provider, black_box(&suite), &CancelToken::new()))
        });
    }

    group.finish();
}

// ── 2. Denoising ─────────────────────────────────────────────────────

fn bench_denoise(c: &mut Criterion) {
    let mut group = c.benchmark_group("denoise");
    let frame = make_frame(2_000);

    for method in ["wavelet", "kalman", "ssa", "emd"] {
        let spec = DenoiseSpec {
            columns: vec!["close".into()],
            ..DenoiseSpec::with_method(method)
        };
        group.bench_function(method, |b| {
            b.iter(|| denoise(black_box(frame.clone()), &spec))
        });
    }

    group.finish();
}

// ── 3. Pivot levels ──────────────────────────────────────────────────

fn bench_pivots(c: &mut Criterion) {
    let mut group = c.benchmark_group("pivot_levels");
    let frame = make_frame(5_000);

    for &levels in &[1usize, 4, 8] {
        let config = PivotConfig {
            levels,
            ..PivotConfig::default()
        };
        group.bench_with_input(BenchmarkId::new("levels", levels), &levels, |b, _| {
            b.iter(|| add_pivot_levels(black_box(frame.clone()), &config))
        });
    }

    group.finish();
}

// ── 4. Multi-instrument ──────────────────────────────────────────────

fn bench_aligned(c: &mut Criterion) {
    let mut group = c.benchmark_group("fetch_aligned");
    group.sample_size(20);
    let provider = SyntheticProvider::new(7, 3_000);

    for &instruments in &[2usize, 4, 8] {
        let names: Vec<String> = (0..instruments).map(|i| format!("SYN{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let request = FetchRequest::new(refs, "1h").with_count(2_000);
        group.bench_with_input(
            BenchmarkId::new("instruments", instruments),
            &instruments,
            |b, _| b.iter(|| fetch(&provider, black_box(&request), &CancelToken::new())),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_fetch, bench_denoise, bench_pivots, bench_aligned);
criterion_main!(benches);
