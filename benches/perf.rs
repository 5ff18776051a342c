use criterion::{Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

use hoops_terminal::dataset::{Dataset, merge};
use hoops_terminal::fake_export::demo_export;
use hoops_terminal::ingest::prepare_export;
use hoops_terminal::view::{FilterSelection, build_chart_view, build_table_view};

const TEAM: &str = "SG Arese U15";

fn season_dataset(matches: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(42);
    (0..matches).fold(Dataset::default(), |dataset, _| {
        let raw = demo_export(&mut rng, TEAM);
        match prepare_export(raw.as_bytes(), TEAM) {
            Ok(Some(prepared)) => merge(dataset, prepared.table),
            _ => dataset,
        }
    })
}

fn bench_prepare_fixture(c: &mut Criterion) {
    c.bench_function("prepare_export_fixture", |b| {
        b.iter(|| {
            let prepared = prepare_export(black_box(HOME_EXPORT.as_bytes()), TEAM).unwrap();
            black_box(prepared.map(|p| p.table.records.len()));
        })
    });
}

fn bench_prepare_demo(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let raw = demo_export(&mut rng, TEAM);
    c.bench_function("prepare_export_demo", |b| {
        b.iter(|| {
            let prepared = prepare_export(black_box(raw.as_bytes()), TEAM).unwrap();
            black_box(prepared.is_some());
        })
    });
}

fn bench_chart_view(c: &mut Criterion) {
    let dataset = season_dataset(40);
    let selection = FilterSelection::default();
    c.bench_function("chart_view_season", |b| {
        b.iter(|| {
            let rows = selection.filter(black_box(&dataset));
            let chart = build_chart_view(&dataset, &rows, selection.aggregate_by_player()).unwrap();
            black_box(chart.median_contribution);
        })
    });
}

fn bench_table_view(c: &mut Criterion) {
    let dataset = season_dataset(40);
    let selection = FilterSelection::default();
    c.bench_function("table_view_season", |b| {
        b.iter(|| {
            let rows = selection.filter(black_box(&dataset));
            let table = build_table_view(&dataset, &rows).unwrap();
            black_box(table.rows.len());
        })
    });
}

fn bench_dataset_csv(c: &mut Criterion) {
    let dataset = season_dataset(40);
    c.bench_function("dataset_csv_roundtrip", |b| {
        b.iter(|| {
            let mut buf = Vec::new();
            dataset.write_csv(&mut buf).unwrap();
            let loaded = Dataset::read_csv(buf.as_slice()).unwrap();
            black_box(loaded.len());
        })
    });
}

criterion_group!(
    perf,
    bench_prepare_fixture,
    bench_prepare_demo,
    bench_chart_view,
    bench_table_view,
    bench_dataset_csv
);
criterion_main!(perf);

static HOME_EXPORT: &str = include_str!("../tests/fixtures/arese_home.csv");
