//! Benchmarks for flowmoments engines
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use flowmoments::joint::{Correlation, JointConfig, JointCore};
use flowmoments::moment::{Kurtosis, MomentConfig, MomentCore};
use flowmoments::power::{PowerConfig, PowerCore};
use flowmoments::subscription::subscribe;
use flowmoments::traits::Metric;

fn values() -> impl Iterator<Item = f64> {
    (0u64..).map(|i| ((i * 7919) % 1000) as f64 / 10.0)
}

// ============================================================================
// Univariate Benchmarks
// ============================================================================

fn bench_moment(c: &mut Criterion) {
    let mut group = c.benchmark_group("moment");
    group.throughput(Throughput::Elements(1));

    for order in [2u32, 4, 8] {
        group.bench_function(format!("push_order{}", order), |b| {
            let core = MomentCore::new(&MomentConfig::new().with_sums(2..=order)).unwrap();
            let mut xs = values();
            b.iter(|| core.push(black_box(xs.next().unwrap_or_default())));
        });
    }

    for window in [16usize, 1024] {
        group.bench_function(format!("push_window{}", window), |b| {
            let config = MomentConfig::new().with_sums([2, 3, 4]).with_window(window);
            let core = MomentCore::new(&config).unwrap();
            let mut xs = values();
            b.iter(|| core.push(black_box(xs.next().unwrap_or_default())));
        });
    }

    group.bench_function("push_decayed", |b| {
        let config = MomentConfig::new().with_sums([2, 3, 4]).with_decay(0.05);
        let core = MomentCore::new(&config).unwrap();
        let mut xs = values();
        b.iter(|| core.push(black_box(xs.next().unwrap_or_default())));
    });

    group.bench_function("kurtosis_value", |b| {
        let mut kurtosis = Kurtosis::new(0).unwrap();
        let core = subscribe::<MomentCore>(&mut [&mut kurtosis]).unwrap();
        for x in values().take(10_000) {
            core.push(x).unwrap();
        }
        b.iter(|| black_box(kurtosis.value()));
    });

    group.finish();
}

// ============================================================================
// Joint Benchmarks
// ============================================================================

fn bench_joint(c: &mut Criterion) {
    let mut group = c.benchmark_group("joint");
    group.throughput(Throughput::Elements(1));

    let shapes: [(&str, Vec<Vec<u32>>); 3] = [
        ("covariance", vec![vec![1, 1]]),
        ("bivariate_order4", vec![vec![2, 2], vec![3, 1], vec![1, 3]]),
        ("trivariate", vec![vec![2, 1, 1], vec![1, 2, 1], vec![1, 1, 2]]),
    ];

    for (name, sums) in shapes {
        let vars = sums[0].len();
        for window in [0usize, 256] {
            group.bench_function(format!("push_{}_window{}", name, window), |b| {
                let config = JointConfig::new().with_sums(sums.clone()).with_window(window);
                let core = JointCore::new(&config).unwrap();
                let mut xs = values();
                let mut row = vec![0.0; vars];
                b.iter(|| {
                    for v in row.iter_mut() {
                        *v = xs.next().unwrap_or_default();
                    }
                    core.push(black_box(&row))
                });
            });
        }
    }

    group.bench_function("correlation_value", |b| {
        let mut corr = Correlation::new(0);
        let core = subscribe::<JointCore>(&mut [&mut corr]).unwrap();
        let mut xs = values();
        for _ in 0..10_000 {
            let x = xs.next().unwrap_or_default();
            core.push(&[x, 2.0 * x + xs.next().unwrap_or_default()]).unwrap();
        }
        b.iter(|| black_box(corr.value()));
    });

    group.finish();
}

// ============================================================================
// Power Sum Benchmarks
// ============================================================================

fn bench_power(c: &mut Criterion) {
    let mut group = c.benchmark_group("power");
    group.throughput(Throughput::Elements(1));

    for window in [0usize, 1024] {
        group.bench_function(format!("push_window{}", window), |b| {
            let config = PowerConfig::new().with_sums(-1..=4).with_window(window);
            let core = PowerCore::new(&config).unwrap();
            let mut xs = values().map(|x| x + 1.0);
            b.iter(|| core.push(black_box(xs.next().unwrap_or(1.0))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_moment, bench_joint, bench_power);
criterion_main!(benches);
