use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::box_score::normalize_block;
use crate::dataset::{Dataset, DatasetStore, merge};
use crate::error::IngestError;
use crate::export_block::{extract_team_block, split_export};
use crate::ingest_log::{self, RunOutcome, RunResult};
use crate::metrics::{DerivedTable, derive_records};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The export has no block for the tracked team; nothing changed.
    Skipped,
    Ingested(IngestSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub match_name: String,
    pub date: String,
    pub rows_added: usize,
    pub total_rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMatch {
    pub match_name: String,
    pub date: String,
    pub table: DerivedTable,
}

/// Extract, normalize and derive one export without touching any store.
pub fn prepare_export(raw: &[u8], team: &str) -> Result<Option<PreparedMatch>, IngestError> {
    let lines = split_export(raw)?;
    let Some(block) = extract_team_block(&lines, team)? else {
        return Ok(None);
    };
    let table = normalize_block(&block)?;
    Ok(Some(PreparedMatch {
        match_name: block.match_name,
        date: block.date,
        table: derive_records(&table),
    }))
}

/// Appends one export to `dataset` and rewrites the store.
///
/// `dataset` only changes once the store has been written, so a failed
/// ingest leaves the in-memory rows as they were.
pub fn ingest_export(
    store: &DatasetStore,
    dataset: &mut Dataset,
    raw: &[u8],
    team: &str,
) -> Result<IngestOutcome> {
    let Some(prepared) = prepare_export(raw, team)? else {
        return Ok(IngestOutcome::Skipped);
    };
    let rows_added = prepared.table.records.len();
    let merged = merge(dataset.clone(), prepared.table);
    store
        .save(&merged)
        .with_context(|| format!("save dataset after ingesting {}", prepared.match_name))?;
    *dataset = merged;

    Ok(IngestOutcome::Ingested(IngestSummary {
        match_name: prepared.match_name,
        date: prepared.date,
        rows_added,
        total_rows: dataset.len(),
    }))
}

pub struct IngestContext<'a> {
    pub store: &'a DatasetStore,
    pub team: &'a str,
    pub ledger: Option<&'a Connection>,
}

/// Result of one ingest plus the console lines describing it.
pub struct IngestReport {
    pub outcome: Result<IngestOutcome>,
    pub logs: Vec<String>,
}

impl IngestReport {
    pub fn is_failure(&self) -> bool {
        self.outcome.is_err()
    }
}

/// Full ingest for one upload: pipeline, ledger bookkeeping, console lines.
/// Ledger problems are reported as warnings and never fail the ingest.
pub fn run_ingest(
    ctx: &IngestContext<'_>,
    dataset: &mut Dataset,
    raw: &[u8],
    source: &str,
) -> IngestReport {
    let mut logs = Vec::new();
    let run_id = ctx.ledger.and_then(|conn| {
        ingest_log::begin_run(conn, source, ctx.team)
            .map_err(|err| logs.push(format!("[WARN] Ingest ledger: {err:#}")))
            .ok()
    });

    let outcome = ingest_export(ctx.store, dataset, raw, ctx.team);

    let (run_outcome, result) = match &outcome {
        Ok(IngestOutcome::Skipped) => {
            logs.push(format!(
                "[INFO] {source}: no block for {}, nothing ingested",
                ctx.team
            ));
            (RunOutcome::Skipped, RunResult::default())
        }
        Ok(IngestOutcome::Ingested(summary)) => {
            let prior = match ctx.ledger {
                Some(conn) => {
                    match ingest_log::prior_ingests(conn, &summary.match_name, &summary.date) {
                        Ok(n) => n,
                        Err(err) => {
                            logs.push(format!("[WARN] Ingest ledger: {err:#}"));
                            0
                        }
                    }
                }
                None => 0,
            };
            let earlier_rows = dataset
                .rows_for_match(&summary.match_name, &summary.date)
                .saturating_sub(summary.rows_added);
            if prior > 0 {
                logs.push(format!(
                    "[WARN] {} ({}) was already ingested {prior} time(s); rows are duplicated",
                    summary.match_name, summary.date
                ));
            } else if earlier_rows > 0 {
                // Rows from before the ledger existed, or with no ledger at all.
                logs.push(format!(
                    "[WARN] dataset already held {earlier_rows} row(s) for {} ({}); rows are duplicated",
                    summary.match_name, summary.date
                ));
            }
            logs.push(format!(
                "[INFO] {source}: {} rows from {} ({}), dataset now {} rows",
                summary.rows_added, summary.match_name, summary.date, summary.total_rows
            ));
            (
                RunOutcome::Ingested,
                RunResult {
                    match_name: Some(summary.match_name.as_str()),
                    match_date: Some(summary.date.as_str()),
                    rows_added: summary.rows_added,
                    error: None,
                },
            )
        }
        Err(err) => {
            logs.push(format!("[ERROR] {source}: {err:#}"));
            (
                RunOutcome::Failed,
                RunResult {
                    error: Some(format!("{err:#}")),
                    ..RunResult::default()
                },
            )
        }
    };

    if let (Some(conn), Some(run_id)) = (ctx.ledger, run_id)
        && let Err(err) = ingest_log::finish_run(conn, run_id, run_outcome, &result)
    {
        logs.push(format!("[WARN] Ingest ledger: {err:#}"));
    }

    IngestReport { outcome, logs }
}
