//! Criterion benchmarks for PeriodLens hot paths.
//!
//! Benchmarks:
//! 1. Period merge (concatenate + stable sort)
//! 2. Date-spread pivot with distinct counting
//! 3. Multi-period comparison over a wide key universe

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::BTreeSet;

use periodlens_core::domain::{Dimension, GroupKey, PeriodDataset, RecordBuilder, TransactionRecord};
use periodlens_core::engine::{
    aggregate, compare, merge, AggFn, ColumnAxis, KeyedValues, MetricSpec, PeriodAggregates,
    PivotSpec, ValueField, ZeroBaselinePolicy,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_records(period: &str, n: usize) -> Vec<TransactionRecord> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 10, 1)
        .unwrap()
        .and_hms_opt(6, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| {
            let at = base + chrono::Duration::minutes((i * 37 % 43_200) as i64);
            RecordBuilder::new(period, format!("customer-{}", i % 500), at, (i % 97) as f64 * 3.5)
                .salesperson(format!("staff-{}", i % 20))
                .category(["新鲜蔬菜", "鲜肉类", "豆制品", "干货"][i % 4])
                .route(format!("R{}", i % 12))
                .build()
        })
        .collect()
}

fn make_keyed(n: usize, scale: f64) -> KeyedValues {
    (0..n)
        .map(|i| (GroupKey::single(format!("k{i:05}")), i as f64 * scale))
        .collect()
}

// ── 1. Merge ─────────────────────────────────────────────────────────

fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge");
    for n in [1_000usize, 10_000, 50_000] {
        let datasets = [
            PeriodDataset::with_all_columns("last", make_records("last", n)),
            PeriodDataset::with_all_columns("this", make_records("this", n)),
        ];
        group.bench_with_input(BenchmarkId::from_parameter(n), &datasets, |b, ds| {
            b.iter(|| merge(black_box(ds), Dimension::Customer, &[]).unwrap())
        });
    }
    group.finish();
}

// ── 2. Pivot ─────────────────────────────────────────────────────────

fn bench_pivot(c: &mut Criterion) {
    let records = make_records("this", 50_000);
    let columns: BTreeSet<Dimension> = Dimension::ALL.into_iter().collect();
    let spec = PivotSpec::new(
        vec![Dimension::Route, Dimension::Category],
        ValueField::Dimension(Dimension::Customer),
        AggFn::CountDistinct,
    )
    .with_column(ColumnAxis::ShipDate);

    c.bench_function("pivot_distinct_by_date_50k", |b| {
        b.iter(|| aggregate(black_box(&records), &spec, &columns).row_means())
    });
}

// ── 3. Compare ───────────────────────────────────────────────────────

fn bench_compare(c: &mut Criterion) {
    let periods = vec![
        PeriodAggregates::new("cur", 30)
            .with_metric("sales", make_keyed(10_000, 1.5))
            .with_metric("days", make_keyed(10_000, 0.01)),
        PeriodAggregates::new("cmp", 31)
            .with_metric("sales", make_keyed(12_000, 1.2))
            .with_metric("days", make_keyed(12_000, 0.01)),
        PeriodAggregates::new("ext", 7).with_metric("sales", make_keyed(8_000, 2.0)),
    ];
    let metrics = [MetricSpec::per_active_day("sales"), MetricSpec::raw("days")];

    c.bench_function("compare_3_periods_12k_keys", |b| {
        b.iter(|| {
            compare(
                black_box(&periods),
                &metrics,
                &[Dimension::Customer],
                ZeroBaselinePolicy::Undefined,
            )
            .unwrap()
        })
    });
}

criterion_group!(benches, bench_merge, bench_pivot, bench_compare);
criterion_main!(benches);
