use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::box_score::{DATE_COLUMN, MATCH_COLUMN, TIME_COLUMN};
use crate::dataset::Dataset;
use crate::error::ViewError;
use crate::game_clock::{format_clock, parse_game_time, total_seconds};
use crate::metrics::{Counters, PlayerRecord};

/// Selection entry standing for every value.
pub const ALL_SENTINEL: &str = "all";

pub const PLUS_MINUS_COLUMN: &str = "+/-";
pub const EFF_COLUMN: &str = "Eff";
pub const NUMBER_COLUMN: &str = "No.";

const MISSING_TIME_LABEL: &str = "00:00";

/// One multi-select: chosen values, possibly including [`ALL_SENTINEL`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub values: Vec<String>,
}

impl Default for Selection {
    fn default() -> Self {
        Self::all()
    }
}

impl Selection {
    pub fn all() -> Self {
        Self {
            values: vec![ALL_SENTINEL.to_string()],
        }
    }

    pub fn only<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.values.iter().any(|v| v == ALL_SENTINEL)
    }

    pub fn concrete(&self) -> impl Iterator<Item = &str> {
        self.values
            .iter()
            .map(String::as_str)
            .filter(|v| *v != ALL_SENTINEL)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    pub fn admits(&self, value: Option<&str>) -> bool {
        self.is_all() || value.is_some_and(|v| self.concrete().any(|c| c == v))
    }

    /// Adds the value if absent, removes it otherwise.
    pub fn toggle(&mut self, value: &str) {
        if let Some(idx) = self.values.iter().position(|v| v == value) {
            self.values.remove(idx);
        } else {
            self.values.push(value.to_string());
        }
    }

    /// Drops values that are neither the sentinel nor in `known`; an emptied
    /// selection falls back to all.
    pub fn retain_known(&mut self, known: &[String]) {
        self.values
            .retain(|v| v == ALL_SENTINEL || known.iter().any(|k| k == v));
        if self.values.is_empty() {
            *self = Self::all();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub matches: Selection,
    pub players: Selection,
}

impl FilterSelection {
    pub fn filter<'a>(&self, dataset: &'a Dataset) -> Vec<&'a PlayerRecord> {
        dataset
            .records()
            .iter()
            .filter(|r| self.matches.admits(r.match_name.as_deref()))
            .filter(|r| self.players.admits(r.player_name.as_deref()))
            .collect()
    }

    /// Per-player totals when everything is in view or several matches are
    /// picked; per-match points otherwise.
    pub fn aggregate_by_player(&self) -> bool {
        (self.matches.is_all() && self.players.is_all()) || self.matches.concrete().count() > 1
    }
}

/// One scatter point, or one player's totals when aggregated.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    pub player_name: String,
    pub match_name: Option<String>,
    pub counters: Counters,
    pub contribution: f64,
    /// `None` when the source row had no Time value; such rows are not plotted.
    pub time_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    pub aggregated: bool,
    pub rows: Vec<ChartRow>,
    pub median_time: Option<f64>,
    pub median_contribution: Option<f64>,
}

impl ChartView {
    /// `(Contribution, seconds)` with the player label.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64, &str)> {
        self.rows.iter().filter_map(|row| {
            row.time_secs
                .map(|secs| (row.contribution, secs, row.player_name.as_str()))
        })
    }

    pub fn time_label(secs: f64) -> String {
        format_clock(secs)
    }
}

pub fn build_chart_view(
    dataset: &Dataset,
    rows: &[&PlayerRecord],
    aggregate: bool,
) -> Result<ChartView, ViewError> {
    if !dataset.has_column(TIME_COLUMN) {
        return Err(ViewError::MissingColumn(TIME_COLUMN.to_string()));
    }

    let mut chart_rows = Vec::with_capacity(rows.len());
    for record in rows {
        let time_secs = match record.time.as_deref() {
            None => None,
            Some(raw) => Some(parse_game_time(raw).map(total_seconds).ok_or_else(|| {
                ViewError::UnparseableTime {
                    player: record.name_or_blank().to_string(),
                    value: raw.to_string(),
                }
            })?),
        };
        chart_rows.push(ChartRow {
            player_name: record.name_or_blank().to_string(),
            match_name: record.match_name.clone(),
            counters: record.counters,
            contribution: record.contribution,
            time_secs,
        });
    }

    if aggregate {
        chart_rows = aggregate_by_player(rows, chart_rows);
    }

    chart_rows.retain(|row| row.time_secs != Some(0.0));

    let mut times = chart_rows.iter().filter_map(|r| r.time_secs).collect::<Vec<_>>();
    let mut contributions = chart_rows.iter().map(|r| r.contribution).collect::<Vec<_>>();

    Ok(ChartView {
        aggregated: aggregate,
        median_time: median(&mut times),
        median_contribution: median(&mut contributions),
        rows: chart_rows,
    })
}

/// Sums counters, Contribution and Time per player name, ordered by name.
/// Rows without a player name belong to no group.
fn aggregate_by_player(records: &[&PlayerRecord], rows: Vec<ChartRow>) -> Vec<ChartRow> {
    let mut groups: BTreeMap<String, ChartRow> = BTreeMap::new();
    for (record, row) in records.iter().zip(rows) {
        let Some(name) = record.player_name.as_deref() else {
            continue;
        };
        let entry = groups.entry(name.to_string()).or_insert_with(|| ChartRow {
            player_name: name.to_string(),
            match_name: None,
            counters: Counters::default(),
            contribution: 0.0,
            time_secs: Some(0.0),
        });
        entry.counters += row.counters;
        entry.contribution += row.contribution;
        if let (Some(total), Some(secs)) = (entry.time_secs.as_mut(), row.time_secs) {
            *total += secs;
        }
    }
    groups.into_values().collect()
}

pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Display-only table: per-match rows, no Date/Match/No., Time as `M:SS`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableView {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }
}

pub fn build_table_view(dataset: &Dataset, rows: &[&PlayerRecord]) -> Result<TableView, ViewError> {
    let mut columns = dataset
        .columns()
        .iter()
        .filter(|c| !matches!(c.as_str(), DATE_COLUMN | MATCH_COLUMN | NUMBER_COLUMN))
        .cloned()
        .collect::<Vec<_>>();
    place_after(&mut columns, EFF_COLUMN, PLUS_MINUS_COLUMN)?;

    let rows = rows
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| {
                    if column == TIME_COLUMN {
                        return table_time(record.time.as_deref());
                    }
                    record
                        .cell(column)
                        .map(Cow::into_owned)
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(TableView { columns, rows })
}

fn table_time(raw: Option<&str>) -> String {
    raw.and_then(parse_game_time)
        .map(|d| format_clock(total_seconds(d)))
        .unwrap_or_else(|| MISSING_TIME_LABEL.to_string())
}

/// Moves `column` to sit immediately after `anchor`.
fn place_after(columns: &mut Vec<String>, column: &str, anchor: &str) -> Result<(), ViewError> {
    if !columns.iter().any(|c| c == anchor) {
        return Err(ViewError::MissingColumn(anchor.to_string()));
    }
    let from = columns
        .iter()
        .position(|c| c == column)
        .ok_or_else(|| ViewError::MissingColumn(column.to_string()))?;
    let moved = columns.remove(from);
    let anchor_at = columns
        .iter()
        .position(|c| c == anchor)
        .ok_or_else(|| ViewError::MissingColumn(anchor.to_string()))?;
    columns.insert(anchor_at + 1, moved);
    Ok(())
}

/// Selectable values for the filter lists: the sentinel, then every distinct
/// value in first-seen order.
pub fn match_options(dataset: &Dataset) -> Vec<String> {
    with_sentinel(dataset.match_names())
}

pub fn player_options(dataset: &Dataset) -> Vec<String> {
    with_sentinel(dataset.player_names())
}

fn with_sentinel(values: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(values.len() + 1);
    out.push(ALL_SENTINEL.to_string());
    out.extend(values);
    out
}
