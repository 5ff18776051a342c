use std::collections::HashMap;

use crate::error::IngestError;
use crate::export_block::MatchBlock;

pub const PLAYER_NAME_COLUMN: &str = "Player Name";
pub const MATCH_COLUMN: &str = "Match";
pub const DATE_COLUMN: &str = "Date";
pub const TIME_COLUMN: &str = "Time";

const DROPPED_COLUMN: &str = "Custom 2";
const STEPS_COLUMN: &str = "Steps";
const TRAVELLING_COLUMN: &str = "Travelling";

/// One player line of the team block, keyed by column name.
///
/// Short source lines are never padded, so trailing columns can be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxScoreRow {
    cells: HashMap<String, String>,
}

impl BoxScoreRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn set(&mut self, column: &str, value: &str) {
        self.cells.insert(column.to_string(), value.to_string());
    }

    fn remove(&mut self, column: &str) -> Option<String> {
        self.cells.remove(column)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoxScoreTable {
    pub columns: Vec<String>,
    pub rows: Vec<BoxScoreRow>,
}

impl BoxScoreTable {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    fn add_constant_column(&mut self, column: &str, value: &str) {
        if !self.has_column(column) {
            self.columns.push(column.to_string());
        }
        for row in &mut self.rows {
            row.set(column, value);
        }
    }

    fn drop_column(&mut self, column: &str) {
        self.columns.retain(|c| c != column);
        for row in &mut self.rows {
            row.remove(column);
        }
    }

    fn rename_column(&mut self, from: &str, to: &str) {
        if !self.has_column(from) {
            return;
        }
        for name in &mut self.columns {
            if name == from {
                *name = to.to_string();
            }
        }
        dedup_in_place(&mut self.columns);
        for row in &mut self.rows {
            // An existing `to` value wins, like a repeated header name.
            if let Some(value) = row.remove(from)
                && row.get(to).is_none()
            {
                row.set(to, &value);
            }
        }
    }
}

/// Turns the team block into a table: line 1 is the header, lines 2.. are
/// players. Rows wider than the header are cut to its width.
pub fn normalize_block(block: &MatchBlock) -> Result<BoxScoreTable, IngestError> {
    let header = block.header_line().ok_or(IngestError::MissingHeader)?;
    let header = header.split(',').collect::<Vec<_>>();

    let rows = block
        .data_lines()
        .iter()
        .map(|line| {
            let mut row = BoxScoreRow::default();
            for (column, value) in header.iter().zip(line.split(',')) {
                // Repeated header names: the first occurrence owns the value.
                row.cells
                    .entry((*column).to_string())
                    .or_insert_with(|| value.to_string());
            }
            row
        })
        .collect::<Vec<_>>();

    let mut columns = header.iter().map(|c| c.to_string()).collect::<Vec<_>>();
    dedup_in_place(&mut columns);

    let mut table = BoxScoreTable { columns, rows };
    table.add_constant_column(MATCH_COLUMN, &block.match_name);
    table.add_constant_column(DATE_COLUMN, &block.date);
    table.drop_column(DROPPED_COLUMN);
    table.rename_column(STEPS_COLUMN, TRAVELLING_COLUMN);
    Ok(table)
}

fn dedup_in_place(columns: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    columns.retain(|c| seen.insert(c.clone()));
}
