use std::collections::VecDeque;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::dataset::{Dataset, DatasetStore};
use crate::error::ViewError;
use crate::ingest::{IngestContext, run_ingest};
use crate::ingest_log;
use crate::view::{
    ChartView, FilterSelection, TableView, build_chart_view, build_table_view, match_options,
    player_options,
};

pub const EMPTY_NOTICE: &str = "No data available. Please upload a match CSV.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Matches,
    Players,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Typing the path of an export to ingest.
    IngestPath,
}

/// Views derived from the dataset and the current selection.
#[derive(Debug, Clone, Default)]
pub struct Views {
    pub chart: Option<Result<ChartView, ViewError>>,
    pub table: Option<Result<TableView, ViewError>>,
    pub match_options: Vec<String>,
    pub player_options: Vec<String>,
}

pub struct AppState {
    pub config: AppConfig,
    pub store: DatasetStore,
    pub dataset: Dataset,
    pub selection: FilterSelection,
    pub views: Views,
    pub ledger: Option<Connection>,
    pub focus: Focus,
    pub match_cursor: usize,
    pub player_cursor: usize,
    pub table_scroll: usize,
    pub input_mode: InputMode,
    pub input: String,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = DatasetStore::new(config.data_file.clone());
        let mut state = Self {
            config,
            store,
            dataset: Dataset::default(),
            selection: FilterSelection::default(),
            views: Views::default(),
            ledger: None,
            focus: Focus::Matches,
            match_cursor: 0,
            player_cursor: 0,
            table_scroll: 0,
            input_mode: InputMode::Normal,
            input: String::new(),
            logs: VecDeque::new(),
            help_overlay: false,
        };

        match state.store.load() {
            Ok(dataset) => {
                state.push_log(format!(
                    "[INFO] Loaded {} rows from {}",
                    dataset.len(),
                    state.store.path().display()
                ));
                state.dataset = dataset;
            }
            Err(err) => state.push_log(format!("[WARN] Dataset load failed: {err:#}")),
        }

        if let Some(path) = state.config.ingest_db.clone() {
            match ingest_log::open_db(&path) {
                Ok(conn) => {
                    if let Ok(Some(run)) = ingest_log::last_run(&conn) {
                        state.push_log(format!(
                            "[INFO] Last ingest: {} ({}) {}",
                            run.source,
                            run.outcome.as_deref().unwrap_or("unfinished"),
                            run.started_at
                        ));
                    }
                    state.ledger = Some(conn);
                }
                Err(err) => state.push_log(format!("[WARN] Ingest ledger unavailable: {err:#}")),
            }
        }

        state.refresh_views();
        state
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > self.config.log_lines {
            self.logs.pop_front();
        }
    }

    /// Replaces the selection, dropping values no longer in the dataset.
    pub fn restore_selection(&mut self, mut selection: FilterSelection) {
        selection.matches.retain_known(&self.dataset.match_names());
        selection.players.retain_known(&self.dataset.player_names());
        self.selection = selection;
        self.refresh_views();
    }

    pub fn refresh_views(&mut self) {
        let match_options = match_options(&self.dataset);
        let player_options = player_options(&self.dataset);
        self.match_cursor = self.match_cursor.min(match_options.len().saturating_sub(1));
        self.player_cursor = self.player_cursor.min(player_options.len().saturating_sub(1));

        if self.dataset.is_empty() {
            self.views = Views {
                match_options,
                player_options,
                ..Views::default()
            };
            return;
        }

        let rows = self.selection.filter(&self.dataset);
        let aggregate = self.selection.aggregate_by_player();
        let chart = build_chart_view(&self.dataset, &rows, aggregate);
        let table = build_table_view(&self.dataset, &rows);
        self.table_scroll = match &table {
            Ok(view) => self.table_scroll.min(view.rows.len().saturating_sub(1)),
            Err(_) => 0,
        };
        self.views = Views {
            chart: Some(chart),
            table: Some(table),
            match_options,
            player_options,
        };
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Matches => Focus::Players,
            Focus::Players => Focus::Table,
            Focus::Table => Focus::Matches,
        };
    }

    pub fn move_cursor(&mut self, down: bool) {
        let (cursor, len) = match self.focus {
            Focus::Matches => (&mut self.match_cursor, self.views.match_options.len()),
            Focus::Players => (&mut self.player_cursor, self.views.player_options.len()),
            Focus::Table => {
                let len = match &self.views.table {
                    Some(Ok(view)) => view.rows.len(),
                    _ => 0,
                };
                (&mut self.table_scroll, len)
            }
        };
        if len == 0 {
            *cursor = 0;
        } else if down {
            *cursor = (*cursor + 1).min(len - 1);
        } else {
            *cursor = cursor.saturating_sub(1);
        }
    }

    /// Toggles the option under the cursor. Returns whether the selection
    /// changed.
    pub fn toggle_current(&mut self) -> bool {
        let toggled = match self.focus {
            Focus::Matches => self
                .views
                .match_options
                .get(self.match_cursor)
                .cloned()
                .map(|value| self.selection.matches.toggle(&value)),
            Focus::Players => self
                .views
                .player_options
                .get(self.player_cursor)
                .cloned()
                .map(|value| self.selection.players.toggle(&value)),
            Focus::Table => None,
        };
        if toggled.is_some() {
            self.refresh_views();
        }
        toggled.is_some()
    }

    pub fn reset_selection(&mut self) {
        self.selection = FilterSelection::default();
        self.refresh_views();
        self.push_log("[INFO] Selection reset to all matches and players");
    }

    /// Ingests one export. The dataset is left untouched on failure.
    pub fn ingest_bytes(&mut self, raw: &[u8], source: &str) -> bool {
        let ctx = IngestContext {
            store: &self.store,
            team: &self.config.team,
            ledger: self.ledger.as_ref(),
        };
        let report = run_ingest(&ctx, &mut self.dataset, raw, source);
        let failed = report.is_failure();
        for line in report.logs {
            self.push_log(line);
        }
        self.refresh_views();
        !failed
    }

    pub fn ingest_file(&mut self, path: &Path) -> bool {
        match read_export(path) {
            Ok(raw) => self.ingest_bytes(&raw, &path.display().to_string()),
            Err(err) => {
                self.push_log(format!("[ERROR] {err:#}"));
                false
            }
        }
    }

    pub fn is_option_selected(&self, focus: Focus, value: &str) -> bool {
        match focus {
            Focus::Matches => self.selection.matches.contains(value),
            Focus::Players => self.selection.players.contains(value),
            Focus::Table => false,
        }
    }
}

pub fn read_export(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read export {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{ALL_SENTINEL, Selection};

    fn test_config(dir: &Path) -> AppConfig {
        AppConfig {
            data_file: dir.join("players_data.csv"),
            export_dir: dir.to_path_buf(),
            ingest_db: None,
            ..AppConfig::default()
        }
    }

    const EXPORT: &str = "\
HoopStats Game Report
SG Arese U15 vs Rho Basket
05/10/2024,Arese Arena
HOME:  SG Arese U15
No.,Player Name,Points,Fouls,Time,+/-,Eff
4,Rossi M.,10,2,5:00,3,7
5,Bianchi L.,4,1,0:00,0,0
Team Events,Timeouts,2";

    #[test]
    fn empty_dataset_has_no_views() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::new(test_config(dir.path()));
        assert!(state.is_empty());
        assert!(state.views.chart.is_none());
        assert_eq!(state.views.match_options, vec![ALL_SENTINEL.to_string()]);
    }

    #[test]
    fn ingest_then_toggle_rebuilds_views() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(test_config(dir.path()));
        assert!(state.ingest_bytes(EXPORT.as_bytes(), "game.csv"));
        assert_eq!(state.dataset.len(), 2);

        let chart = state.views.chart.clone().unwrap().unwrap();
        assert!(chart.aggregated);
        assert_eq!(chart.points().count(), 1);

        // Deselect "all" then pick the single match.
        state.focus = Focus::Matches;
        state.match_cursor = 0;
        assert!(state.toggle_current());
        state.match_cursor = 1;
        assert!(state.toggle_current());
        assert_eq!(
            state.selection.matches,
            Selection::only(["SG Arese U15 vs Rho Basket"])
        );
        let chart = state.views.chart.clone().unwrap().unwrap();
        assert!(!chart.aggregated);
    }

    #[test]
    fn log_is_bounded_by_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = AppState::new(test_config(dir.path()));
        for idx in 0..500 {
            state.push_log(format!("[INFO] {idx}"));
        }
        assert_eq!(state.logs.len(), state.config.log_lines);
        assert_eq!(state.logs.back().map(String::as_str), Some("[INFO] 499"));
    }
}
