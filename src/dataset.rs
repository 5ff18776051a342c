use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::metrics::{DerivedTable, PlayerRecord};

/// Every player row ingested so far, in ingest order.
///
/// Append-only: ingesting the same export twice stores its rows twice.
/// (Player Name, Match, Date) would be the natural key if that ever changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<PlayerRecord>,
}

impl Dataset {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[PlayerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Appends after the existing rows; new columns join the end of the
    /// column list in the order they first appear. Returns rows added.
    pub fn append(&mut self, table: DerivedTable) -> usize {
        for column in table.columns {
            if !self.has_column(&column) {
                self.columns.push(column);
            }
        }
        let added = table.records.len();
        self.records.extend(table.records);
        added
    }

    /// Distinct Match values in first-seen order.
    pub fn match_names(&self) -> Vec<String> {
        distinct(self.records.iter().filter_map(|r| r.match_name.as_deref()))
    }

    /// Distinct Player Name values in first-seen order.
    pub fn player_names(&self) -> Vec<String> {
        distinct(self.records.iter().filter_map(|r| r.player_name.as_deref()))
    }

    pub fn rows_for_match(&self, match_name: &str, date: &str) -> usize {
        self.records
            .iter()
            .filter(|r| r.match_name.as_deref() == Some(match_name) && r.date.as_deref() == Some(date))
            .count()
    }

    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let mut columns = rdr
            .headers()
            .context("read dataset header")?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let mut seen = HashSet::new();
        columns.retain(|c| seen.insert(c.clone()));
        if columns.iter().all(|c| c.is_empty()) {
            return Ok(Self::default());
        }

        let mut records = Vec::new();
        for (idx, row) in rdr.records().enumerate() {
            let row = row.with_context(|| format!("read dataset row {}", idx + 1))?;
            // Empty cells are missing values, matching what `write_csv` emits.
            let record = PlayerRecord::from_lookup(&columns, |column| {
                columns
                    .iter()
                    .position(|c| c == column)
                    .and_then(|i| row.get(i))
                    .filter(|v| !v.is_empty())
            });
            records.push(record);
        }
        Ok(Self { columns, records })
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        if self.columns.is_empty() {
            return Ok(());
        }
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.columns)
            .context("write dataset header")?;
        for record in &self.records {
            let cells = self
                .columns
                .iter()
                .map(|c| record.cell(c).map(Cow::into_owned).unwrap_or_default());
            wtr.write_record(cells).context("write dataset row")?;
        }
        wtr.flush().context("flush dataset")?;
        Ok(())
    }
}

/// Concatenates `new` after `existing`; no deduplication.
pub fn merge(mut existing: Dataset, new: DerivedTable) -> Dataset {
    existing.append(new);
    existing
}

/// The flat file holding the dataset between sessions, read and written
/// wholesale.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty dataset.
    pub fn load(&self) -> Result<Dataset> {
        if !self.path.exists() {
            return Ok(Dataset::default());
        }
        let file = fs::File::open(&self.path)
            .with_context(|| format!("open dataset {}", self.path.display()))?;
        Dataset::read_csv(file).with_context(|| format!("parse dataset {}", self.path.display()))
    }

    /// Overwrites the whole file via a temp file and rename.
    pub fn save(&self, dataset: &Dataset) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dataset dir {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("csv.tmp");
        let mut buf = Vec::new();
        dataset.write_csv(&mut buf)?;
        fs::write(&tmp, buf).with_context(|| format!("write dataset {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("swap dataset {}", self.path.display()))?;
        Ok(())
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for value in values {
        if seen.insert(value) {
            out.push(value.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derived(match_name: &str, players: &[(&str, &str)]) -> DerivedTable {
        let columns = ["Player Name", "Points", "Match", "Date"]
            .map(str::to_string)
            .to_vec();
        let records = players
            .iter()
            .map(|(name, points)| {
                PlayerRecord::from_lookup(&columns, |c| match c {
                    "Player Name" => Some(*name),
                    "Points" => Some(*points),
                    "Match" => Some(match_name),
                    "Date" => Some("01/01/2025"),
                    _ => None,
                })
            })
            .collect();
        DerivedTable { columns, records }
    }

    #[test]
    fn append_keeps_existing_rows_as_prefix() {
        let mut dataset = Dataset::default();
        dataset.append(derived("M1", &[("A", "1"), ("B", "2")]));
        let before = dataset.records().to_vec();

        let merged = merge(dataset, derived("M2", &[("C", "3")]));
        assert_eq!(merged.len(), 3);
        assert_eq!(&merged.records()[..2], &before[..]);
        assert_eq!(merged.records()[2].name_or_blank(), "C");
        assert_eq!(merged.match_names(), vec!["M1", "M2"]);
    }

    #[test]
    fn csv_round_trip_treats_empty_cells_as_missing() {
        let raw = "Player Name,Points,Time,Eff,Match,Date\nA,10,5:00,,M1,01/01/2025\nB,x,,3,M1,01/01/2025\n";
        let dataset = Dataset::read_csv(raw.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[1].counters.points, 0.0);
        assert_eq!(dataset.records()[1].time, None);
        assert!(!dataset.records()[0].extras.contains_key("Eff"));

        let mut out = Vec::new();
        dataset.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Player Name,Points,Time,Eff,Match,Date\n"));
        assert!(text.contains("A,10,5:00,,M1,01/01/2025"));
        assert!(text.contains("B,0,,3,M1,01/01/2025"));
    }

    #[test]
    fn store_load_of_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DatasetStore::new(dir.path().join("players_data.csv"));
        assert!(store.load().unwrap().is_empty());
    }
}
