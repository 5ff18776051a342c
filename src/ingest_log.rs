use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Ingested,
    Skipped,
    Failed,
}

impl RunOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RunOutcome::Ingested => "ingested",
            RunOutcome::Skipped => "skipped",
            RunOutcome::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestRun {
    pub run_id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub source: String,
    pub team: String,
    pub match_name: Option<String>,
    pub match_date: Option<String>,
    pub rows_added: usize,
    pub outcome: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RunResult<'a> {
    pub match_name: Option<&'a str>,
    pub match_date: Option<&'a str>,
    pub rows_added: usize,
    pub error: Option<String>,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NULL,
            source TEXT NOT NULL,
            team TEXT NOT NULL,
            match_name TEXT NULL,
            match_date TEXT NULL,
            rows_added INTEGER NOT NULL DEFAULT 0,
            outcome TEXT NULL,
            error TEXT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_ingest_runs_match ON ingest_runs(match_name, match_date);
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub fn begin_run(conn: &Connection, source: &str, team: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO ingest_runs(started_at, source, team) VALUES (?1, ?2, ?3)",
        params![Utc::now().to_rfc3339(), source, team],
    )
    .context("insert ingest run")?;
    Ok(conn.last_insert_rowid())
}

pub fn finish_run(
    conn: &Connection,
    run_id: i64,
    outcome: RunOutcome,
    result: &RunResult<'_>,
) -> Result<()> {
    conn.execute(
        "UPDATE ingest_runs
         SET finished_at = ?1, outcome = ?2, match_name = ?3, match_date = ?4,
             rows_added = ?5, error = ?6
         WHERE run_id = ?7",
        params![
            Utc::now().to_rfc3339(),
            outcome.as_str(),
            result.match_name,
            result.match_date,
            result.rows_added as i64,
            result.error,
            run_id
        ],
    )
    .context("update ingest run")?;
    Ok(())
}

/// Successful earlier ingests of the same match. Used for warnings only;
/// duplicate rows are still stored.
pub fn prior_ingests(conn: &Connection, match_name: &str, match_date: &str) -> Result<usize> {
    let count = conn
        .query_row(
            "SELECT COUNT(*) FROM ingest_runs
             WHERE outcome = 'ingested' AND match_name = ?1 AND match_date = ?2",
            params![match_name, match_date],
            |row| row.get::<_, i64>(0),
        )
        .context("count prior ingests")?;
    Ok(usize::try_from(count).unwrap_or_default())
}

pub fn last_run(conn: &Connection) -> Result<Option<IngestRun>> {
    conn.query_row(
        &format!("{RUN_COLUMNS} ORDER BY run_id DESC LIMIT 1"),
        [],
        decode_run,
    )
    .optional()
    .context("query last ingest run")
}

pub fn recent_runs(conn: &Connection, limit: usize) -> Result<Vec<IngestRun>> {
    let mut stmt = conn
        .prepare(&format!("{RUN_COLUMNS} ORDER BY run_id DESC LIMIT ?1"))
        .context("prepare recent runs query")?;
    let rows = stmt
        .query_map(params![limit as i64], decode_run)
        .context("query recent runs")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode ingest run")?);
    }
    Ok(out)
}

const RUN_COLUMNS: &str = "SELECT run_id, started_at, finished_at, source, team, match_name, \
                           match_date, rows_added, outcome, error FROM ingest_runs";

fn decode_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<IngestRun> {
    Ok(IngestRun {
        run_id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        source: row.get(3)?,
        team: row.get(4)?,
        match_name: row.get(5)?,
        match_date: row.get(6)?,
        rows_added: usize::try_from(row.get::<_, i64>(7)?).unwrap_or_default(),
        outcome: row.get(8)?,
        error: row.get(9)?,
    })
}
