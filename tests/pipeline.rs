use std::fs;
use std::path::PathBuf;

use hoops_terminal::dataset::{Dataset, DatasetStore};
use hoops_terminal::error::IngestError;
use hoops_terminal::ingest::{IngestContext, IngestOutcome, ingest_export, prepare_export, run_ingest};
use hoops_terminal::ingest_log;

const TEAM: &str = "SG Arese U15";

fn read_fixture(name: &str) -> Vec<u8> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read(path).expect("fixture file should be readable")
}

#[test]
fn home_block_is_normalized_and_derived() {
    let raw = read_fixture("arese_home.csv");
    let prepared = prepare_export(&raw, TEAM)
        .expect("fixture should parse")
        .expect("team block present");

    assert_eq!(prepared.match_name, "SG Arese U15 vs Rho Basket");
    assert_eq!(prepared.date, "05/10/2024");

    let table = &prepared.table;
    assert_eq!(table.records.len(), 4);
    assert!(!table.columns.iter().any(|c| c == "Custom 2"));
    assert!(!table.columns.iter().any(|c| c == "Steps"));
    assert!(table.columns.iter().any(|c| c == "Travelling"));
    assert_eq!(table.columns.last().map(String::as_str), Some("Contribution"));
    // Header width minus Custom 2, plus Match, Date and Contribution.
    assert_eq!(table.columns.len(), 22 - 1 + 2 + 1);

    let rossi = &table.records[0];
    assert_eq!(rossi.player_name.as_deref(), Some("Rossi M."));
    assert_eq!(rossi.match_name.as_deref(), Some("SG Arese U15 vs Rho Basket"));
    assert_eq!(rossi.counters.travelling, 1.0);
    assert_eq!(rossi.contribution, 23.0);
    // Cells past the header width are dropped.
    assert!(rossi.extras.values().all(|v| v != "extra"));

    let bianchi = &table.records[1];
    assert_eq!(bianchi.contribution, 8.0);

    // Short row: missing counters count as zero.
    let ferrari = &table.records[3];
    assert_eq!(ferrari.counters.points, 4.0);
    assert_eq!(ferrari.counters.fouls, 0.0);
    assert_eq!(ferrari.contribution, 4.0);
    assert_eq!(ferrari.cell("+/-"), None);
}

#[test]
fn visitors_block_is_found_after_opponent() {
    let raw = read_fixture("arese_visitors.csv");
    let prepared = prepare_export(&raw, TEAM).unwrap().unwrap();
    assert_eq!(prepared.match_name, "Rho Basket vs SG Arese U15");
    assert_eq!(prepared.date, "12/10/2024");
    let names = prepared
        .table
        .records
        .iter()
        .map(|r| r.name_or_blank())
        .collect::<Vec<_>>();
    assert_eq!(names, ["Rossi M.", "Bianchi L.", "Ricci F."]);
    assert_eq!(prepared.table.records[0].contribution, 16.0);
    assert_eq!(prepared.table.records[1].contribution, 1.0);
}

#[test]
fn export_without_team_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("players_data.csv"));
    let mut dataset = Dataset::default();

    let outcome = ingest_export(&store, &mut dataset, &read_fixture("other_teams.csv"), TEAM).unwrap();
    assert_eq!(outcome, IngestOutcome::Skipped);
    assert!(dataset.is_empty());
    assert!(!store.path().exists());
}

#[test]
fn missing_end_marker_leaves_dataset_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("players_data.csv"));
    let mut dataset = Dataset::default();
    ingest_export(&store, &mut dataset, &read_fixture("arese_home.csv"), TEAM).unwrap();
    let before = fs::read(store.path()).unwrap();

    let err = ingest_export(
        &store,
        &mut dataset,
        &read_fixture("missing_team_events.csv"),
        TEAM,
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<IngestError>(),
        Some(IngestError::MissingEndMarker { start: 7, .. })
    ));
    assert_eq!(dataset.len(), 4);
    assert_eq!(fs::read(store.path()).unwrap(), before);
}

#[test]
fn short_export_leaves_dataset_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("players_data.csv"));
    let mut dataset = Dataset::default();
    ingest_export(&store, &mut dataset, &read_fixture("arese_home.csv"), TEAM).unwrap();
    let before = fs::read(store.path()).unwrap();

    let raw = format!("HOME:  {TEAM}\nTeam Events\n");
    let err = ingest_export(&store, &mut dataset, raw.as_bytes(), TEAM).unwrap_err();
    assert_eq!(
        err.downcast_ref::<IngestError>(),
        Some(&IngestError::MissingPreamble { lines: 2 })
    );
    assert_eq!(dataset.len(), 4);
    assert_eq!(fs::read(store.path()).unwrap(), before);
}

#[test]
fn invalid_utf8_is_reported() {
    let err = prepare_export(&[0x48, 0x4f, 0xff, 0xfe], TEAM).unwrap_err();
    assert!(matches!(err, IngestError::InvalidUtf8(_)));
}

#[test]
fn repeated_ingest_appends_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("players_data.csv"));
    let mut dataset = store.load().unwrap();
    let raw = read_fixture("arese_home.csv");

    ingest_export(&store, &mut dataset, &raw, TEAM).unwrap();
    let outcome = ingest_export(&store, &mut dataset, &raw, TEAM).unwrap();
    let IngestOutcome::Ingested(summary) = outcome else {
        panic!("expected an ingest");
    };
    assert_eq!(summary.rows_added, 4);
    assert_eq!(summary.total_rows, 8);
    assert_eq!(dataset.rows_for_match("SG Arese U15 vs Rho Basket", "05/10/2024"), 8);

    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.len(), 8);
    assert_eq!(reloaded.columns(), dataset.columns());
    assert_eq!(reloaded.records()[0].contribution, 23.0);
    assert_eq!(reloaded.records()[0].time.as_deref(), Some("18:30"));
    assert_eq!(reloaded.records()[3].cell("+/-"), None);
}

#[test]
fn second_match_keeps_first_seen_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("players_data.csv"));
    let mut dataset = Dataset::default();
    ingest_export(&store, &mut dataset, &read_fixture("arese_home.csv"), TEAM).unwrap();
    ingest_export(&store, &mut dataset, &read_fixture("arese_visitors.csv"), TEAM).unwrap();

    assert_eq!(dataset.len(), 7);
    assert_eq!(
        dataset.match_names(),
        ["SG Arese U15 vs Rho Basket", "Rho Basket vs SG Arese U15"]
    );
    assert_eq!(
        dataset.player_names(),
        ["Rossi M.", "Bianchi L.", "Colombo A.", "Ferrari G.", "Ricci F."]
    );
}

#[test]
fn duplicate_match_is_flagged_without_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("players_data.csv"));
    let ctx = IngestContext {
        store: &store,
        team: TEAM,
        ledger: None,
    };
    let mut dataset = Dataset::default();
    let raw = read_fixture("arese_home.csv");

    let first = run_ingest(&ctx, &mut dataset, &raw, "arese_home.csv");
    assert!(first.logs.iter().all(|l| !l.starts_with("[WARN]")));

    let second = run_ingest(&ctx, &mut dataset, &raw, "arese_home.csv");
    assert!(second.logs.iter().any(|l| l.contains("already held 4 row(s)")));
    assert_eq!(dataset.len(), 8);
}

#[test]
fn ledger_warns_on_duplicate_match() {
    let dir = tempfile::tempdir().unwrap();
    let store = DatasetStore::new(dir.path().join("players_data.csv"));
    let ledger = ingest_log::open_in_memory().unwrap();
    let ctx = IngestContext {
        store: &store,
        team: TEAM,
        ledger: Some(&ledger),
    };
    let mut dataset = Dataset::default();
    let raw = read_fixture("arese_home.csv");

    let first = run_ingest(&ctx, &mut dataset, &raw, "arese_home.csv");
    assert!(!first.is_failure());
    assert!(first.logs.iter().all(|l| !l.starts_with("[WARN]")));

    let second = run_ingest(&ctx, &mut dataset, &raw, "arese_home.csv");
    assert!(second.logs.iter().any(|l| l.contains("already ingested 1 time(s)")));
    assert_eq!(dataset.len(), 8);

    let broken = run_ingest(
        &ctx,
        &mut dataset,
        &read_fixture("missing_team_events.csv"),
        "missing_team_events.csv",
    );
    assert!(broken.is_failure());
    assert!(broken.logs.iter().any(|l| l.starts_with("[ERROR]")));

    let runs = ingest_log::recent_runs(&ledger, 10).unwrap();
    let outcomes = runs
        .iter()
        .map(|r| r.outcome.as_deref().unwrap_or(""))
        .collect::<Vec<_>>();
    assert_eq!(outcomes, ["failed", "ingested", "ingested"]);
}
