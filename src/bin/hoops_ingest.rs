use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use hoops_terminal::config::{AppConfig, load_dotenv};
use hoops_terminal::dataset::DatasetStore;
use hoops_terminal::fake_export::demo_export;
use hoops_terminal::ingest::{IngestContext, IngestOutcome, run_ingest};
use hoops_terminal::ingest_log;
use hoops_terminal::state::read_export;

const HISTORY_LIMIT: usize = 20;

fn main() -> Result<()> {
    load_dotenv();
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    let mut config = AppConfig::from_env();
    if let Some(path) = parse_value_arg(&args, "--data") {
        config.data_file = PathBuf::from(path);
    }
    if let Some(team) = parse_value_arg(&args, "--team") {
        config.team = team;
    }
    if let Some(db) = parse_value_arg(&args, "--db") {
        config.ingest_db = Some(PathBuf::from(db));
    }

    let ledger = match &config.ingest_db {
        Some(path) => Some(ingest_log::open_db(path)?),
        None => None,
    };

    if has_flag(&args, "--history") {
        let conn = ledger
            .as_ref()
            .context("no ingest ledger configured (set HOOPS_INGEST_DB or --db)")?;
        print_history(conn)?;
        return Ok(());
    }

    let files = positional_args(&args);
    let demo = has_flag(&args, "--demo");
    if files.is_empty() && !demo {
        return Err(anyhow!(
            "usage: hoops_ingest [--data=FILE] [--team=NAME] [--db=FILE] [--demo] [--history] EXPORT..."
        ));
    }

    let store = DatasetStore::new(config.data_file.clone());
    let mut dataset = store.load()?;
    let ctx = IngestContext {
        store: &store,
        team: &config.team,
        ledger: ledger.as_ref(),
    };

    let mut ingested = 0usize;
    let mut failed = 0usize;
    let mut sources = files
        .iter()
        .map(|file| {
            let path = PathBuf::from(file);
            read_export(&path).map(|raw| (path.display().to_string(), raw))
        })
        .collect::<Vec<_>>();
    if demo {
        let raw = demo_export(&mut rand::thread_rng(), &config.team);
        sources.push(Ok(("demo export".to_string(), raw.into_bytes())));
    }

    for source in sources {
        let (label, raw) = match source {
            Ok(item) => item,
            Err(err) => {
                eprintln!("[ERROR] {err:#}");
                failed += 1;
                continue;
            }
        };
        let report = run_ingest(&ctx, &mut dataset, &raw, &label);
        for line in &report.logs {
            if line.starts_with("[INFO]") {
                println!("{line}");
            } else {
                eprintln!("{line}");
            }
        }
        match report.outcome {
            Ok(IngestOutcome::Ingested(_)) => ingested += 1,
            Ok(IngestOutcome::Skipped) => {}
            Err(_) => failed += 1,
        }
    }

    println!("Ingest complete");
    println!("Data file: {}", store.path().display());
    println!("Team: {}", config.team);
    println!("Exports ingested: {ingested}");
    println!("Rows in dataset: {}", dataset.len());
    if failed > 0 {
        return Err(anyhow!("{failed} export(s) failed"));
    }
    Ok(())
}

fn print_history(conn: &rusqlite::Connection) -> Result<()> {
    let runs = ingest_log::recent_runs(conn, HISTORY_LIMIT)?;
    if runs.is_empty() {
        println!("No ingest runs recorded");
        return Ok(());
    }
    for run in runs {
        println!(
            "#{} {} {} {} rows={} match={} date={}",
            run.run_id,
            run.started_at,
            run.outcome.as_deref().unwrap_or("unfinished"),
            run.source,
            run.rows_added,
            run.match_name.as_deref().unwrap_or("n/a"),
            run.match_date.as_deref().unwrap_or("n/a")
        );
        if let Some(err) = run.error {
            println!("   error: {err}");
        }
    }
    Ok(())
}

fn parse_value_arg(args: &[String], name: &str) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}=")) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}

fn has_flag(args: &[String], name: &str) -> bool {
    args.iter().any(|arg| arg == name)
}

/// Arguments that are neither flags nor the value of a spaced flag.
fn positional_args(args: &[String]) -> Vec<String> {
    const VALUE_FLAGS: [&str; 3] = ["--data", "--team", "--db"];
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(arg.clone());
    }
    out
}
