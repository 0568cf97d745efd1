//! Criterion benchmarks for sapling-tree: induction, threshold search and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use sapling_tree::{Dataset, DecisionTreeConfig, Record, ThresholdPolicy, best_threshold};

const COLORS: [&str; 5] = ["red", "green", "blue", "gray", "white"];

fn make_table(
    n_samples: usize,
    n_numeric: usize,
    n_classes: usize,
    seed: u64,
) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut header: Vec<String> = (0..n_numeric).map(|f| format!("f{f}")).collect();
    header.push("color".to_string());
    header.push("class".to_string());

    let records = (0..n_samples)
        .map(|i| {
            let class = i % n_classes;
            let mut row: Vec<String> = (0..n_numeric)
                .map(|f| {
                    let base = if f < 3 { class as f64 * 3.0 } else { 0.0 };
                    format!("{:.4}", base + rng.r#gen::<f64>() * 2.0)
                })
                .collect();
            row.push(COLORS[rng.gen_range(0..COLORS.len())].to_string());
            row.push(format!("c{class}"));
            row
        })
        .collect();
    (header, records)
}

fn to_records(header: &[String], rows: &[Vec<String>]) -> Vec<Record> {
    rows.iter()
        .map(|row| header.iter().cloned().zip(row.iter().cloned()).collect())
        .collect()
}

fn bench_fit(c: &mut Criterion) {
    let (header, records) = make_table(500, 10, 5, 42);
    let ds = Dataset::from_records(header, records).unwrap();
    let cfg = DecisionTreeConfig::new();

    c.bench_function("tree_fit_500x10_5class_midpoint", |b| {
        b.iter(|| cfg.fit(&ds).unwrap());
    });

    let cfg = DecisionTreeConfig::new().with_threshold_policy(ThresholdPolicy::Median);
    c.bench_function("tree_fit_500x10_5class_median", |b| {
        b.iter(|| cfg.fit(&ds).unwrap());
    });
}

fn bench_best_threshold(c: &mut Criterion) {
    let (header, records) = make_table(2000, 1, 5, 42);
    let ds = Dataset::from_records(header, records).unwrap();
    let rows = ds.row_refs();

    c.bench_function("best_threshold_2000_rows", |b| {
        b.iter(|| best_threshold(&rows, 0, ThresholdPolicy::Midpoint));
    });
}

fn bench_predict_batch(c: &mut Criterion) {
    let (header, records) = make_table(500, 10, 5, 42);
    let inputs = to_records(&header, &records);
    let ds = Dataset::from_records(header, records).unwrap();
    let tree = DecisionTreeConfig::new().fit(&ds).unwrap();

    c.bench_function("tree_predict_batch_500", |b| {
        b.iter(|| tree.predict_batch(&inputs));
    });
}

criterion_group!(benches, bench_fit, bench_best_threshold, bench_predict_batch);
criterion_main!(benches);
