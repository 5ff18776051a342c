use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::AddAssign;

use crate::box_score::{
    BoxScoreTable, DATE_COLUMN, MATCH_COLUMN, PLAYER_NAME_COLUMN, TIME_COLUMN,
};

pub const CONTRIBUTION_COLUMN: &str = "Contribution";

pub const COUNTER_COLUMNS: [&str; 10] = [
    "Points",
    "Assists",
    "Block",
    "Deflection",
    "Steal",
    "Def Reb",
    "Off Reb",
    "Fouls",
    "Travelling",
    "T-over",
];

/// The ten box-score counters feeding Contribution, in `COUNTER_COLUMNS` order.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Counters {
    pub points: f64,
    pub assists: f64,
    pub block: f64,
    pub deflection: f64,
    pub steal: f64,
    pub def_reb: f64,
    pub off_reb: f64,
    pub fouls: f64,
    pub travelling: f64,
    pub turnovers: f64,
}

impl Counters {
    pub fn from_lookup<'a>(get: impl Fn(&str) -> Option<&'a str>) -> Self {
        let [
            points,
            assists,
            block,
            deflection,
            steal,
            def_reb,
            off_reb,
            fouls,
            travelling,
            turnovers,
        ] = COUNTER_COLUMNS.map(|column| coerce_number(get(column)));
        Self {
            points,
            assists,
            block,
            deflection,
            steal,
            def_reb,
            off_reb,
            fouls,
            travelling,
            turnovers,
        }
    }

    pub fn values(&self) -> [f64; 10] {
        [
            self.points,
            self.assists,
            self.block,
            self.deflection,
            self.steal,
            self.def_reb,
            self.off_reb,
            self.fouls,
            self.travelling,
            self.turnovers,
        ]
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        let idx = COUNTER_COLUMNS.iter().position(|c| *c == column)?;
        Some(self.values()[idx])
    }

    pub fn contribution(&self) -> f64 {
        self.points + self.assists + self.block + self.deflection + self.steal + self.def_reb
            + self.off_reb
            - self.fouls
            - self.travelling
            - self.turnovers
    }
}

impl AddAssign for Counters {
    fn add_assign(&mut self, rhs: Self) {
        self.points += rhs.points;
        self.assists += rhs.assists;
        self.block += rhs.block;
        self.deflection += rhs.deflection;
        self.steal += rhs.steal;
        self.def_reb += rhs.def_reb;
        self.off_reb += rhs.off_reb;
        self.fouls += rhs.fouls;
        self.travelling += rhs.travelling;
        self.turnovers += rhs.turnovers;
    }
}

/// Numeric coercion for counters: anything that is not a finite number
/// (absent, blank, text, NaN) counts as zero.
pub fn coerce_number(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Whole numbers print without a fractional part so stored files stay tidy.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// A player's line for one match, with typed counters and the source's
/// remaining columns carried as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub player_name: Option<String>,
    pub counters: Counters,
    pub contribution: f64,
    pub time: Option<String>,
    pub match_name: Option<String>,
    pub date: Option<String>,
    pub extras: HashMap<String, String>,
}

impl PlayerRecord {
    /// Builds a record from any column lookup; Contribution is always
    /// recomputed from the coerced counters.
    pub fn from_lookup<'a>(columns: &[String], get: impl Fn(&str) -> Option<&'a str>) -> Self {
        let counters = Counters::from_lookup(&get);
        let text = |column: &str| {
            get(column)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let extras = columns
            .iter()
            .filter(|c| !is_typed_column(c))
            .filter_map(|c| get(c).map(|v| (c.clone(), v.to_string())))
            .collect();

        Self {
            player_name: text(PLAYER_NAME_COLUMN),
            contribution: counters.contribution(),
            counters,
            time: text(TIME_COLUMN),
            match_name: text(MATCH_COLUMN),
            date: text(DATE_COLUMN),
            extras,
        }
    }

    pub fn name_or_blank(&self) -> &str {
        self.player_name.as_deref().unwrap_or("")
    }

    /// Text form of a column, as it is stored and displayed.
    pub fn cell(&self, column: &str) -> Option<Cow<'_, str>> {
        if let Some(value) = self.counters.get(column) {
            return Some(Cow::Owned(format_number(value)));
        }
        match column {
            CONTRIBUTION_COLUMN => Some(Cow::Owned(format_number(self.contribution))),
            PLAYER_NAME_COLUMN => self.player_name.as_deref().map(Cow::Borrowed),
            TIME_COLUMN => self.time.as_deref().map(Cow::Borrowed),
            MATCH_COLUMN => self.match_name.as_deref().map(Cow::Borrowed),
            DATE_COLUMN => self.date.as_deref().map(Cow::Borrowed),
            _ => self.extras.get(column).map(|v| Cow::Borrowed(v.as_str())),
        }
    }
}

fn is_typed_column(column: &str) -> bool {
    COUNTER_COLUMNS.contains(&column)
        || matches!(
            column,
            CONTRIBUTION_COLUMN | PLAYER_NAME_COLUMN | TIME_COLUMN | MATCH_COLUMN | DATE_COLUMN
        )
}

/// Records of one ingested block, with the column order they will be stored in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedTable {
    pub columns: Vec<String>,
    pub records: Vec<PlayerRecord>,
}

pub fn derive_records(table: &BoxScoreTable) -> DerivedTable {
    let mut columns = table.columns.clone();
    for counter in COUNTER_COLUMNS {
        if !table.has_column(counter) {
            columns.push(counter.to_string());
        }
    }
    if !table.has_column(CONTRIBUTION_COLUMN) {
        columns.push(CONTRIBUTION_COLUMN.to_string());
    }

    let records = table
        .rows
        .iter()
        .map(|row| PlayerRecord::from_lookup(&table.columns, |c| row.get(c)))
        .collect();

    DerivedTable { columns, records }
}
