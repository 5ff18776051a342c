use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::view::{ChartView, TableView};

pub struct ExportReport {
    pub path: PathBuf,
    pub table_rows: usize,
    pub chart_points: usize,
}

pub fn default_export_path(dir: &Path) -> PathBuf {
    dir.join(format!(
        "hoops_view_{}.xlsx",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// Writes the table view and, when it built, the chart data to a workbook.
pub fn export_views(path: &Path, table: &TableView, chart: Option<&ChartView>) -> Result<ExportReport> {
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Players")?;
        write_string_row(sheet, 0, &table.columns)?;
        for (idx, row) in table.rows.iter().enumerate() {
            write_string_row(sheet, idx as u32 + 1, row)?;
        }
    }

    let mut chart_points = 0;
    if let Some(chart) = chart {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Chart data")?;
        let header = ["Player Name", "Contribution", "Time (s)", "Time"].map(str::to_string);
        write_string_row(sheet, 0, &header)?;
        for (idx, (contribution, secs, name)) in chart.points().enumerate() {
            let row = idx as u32 + 1;
            sheet
                .write_string(row, 0, name)
                .with_context(|| format!("write chart name ({row})"))?;
            sheet
                .write_number(row, 1, contribution)
                .with_context(|| format!("write chart contribution ({row})"))?;
            sheet
                .write_number(row, 2, secs)
                .with_context(|| format!("write chart time ({row})"))?;
            sheet
                .write_string(row, 3, ChartView::time_label(secs))
                .with_context(|| format!("write chart clock ({row})"))?;
            chart_points += 1;
        }

        let footer = chart_points as u32 + 2;
        if let Some(median) = chart.median_contribution {
            sheet.write_string(footer, 0, "Median Contribution")?;
            sheet.write_number(footer, 1, median)?;
        }
        if let Some(median) = chart.median_time {
            sheet.write_string(footer + 1, 0, "Median Time")?;
            sheet.write_number(footer + 1, 2, median)?;
            sheet.write_string(footer + 1, 3, ChartView::time_label(median))?;
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        path: path.to_path_buf(),
        table_rows: table.rows.len(),
        chart_points,
    })
}

fn write_string_row(worksheet: &mut Worksheet, row_idx: u32, row: &[String]) -> Result<()> {
    for (col_idx, value) in row.iter().enumerate() {
        worksheet
            .write_string(row_idx, col_idx as u16, value)
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, merge};
    use crate::ingest::prepare_export;
    use crate::view::{FilterSelection, build_chart_view, build_table_view};

    const EXPORT: &str = "\
HoopStats Game Report
SG Arese U15 vs Rho Basket
05/10/2024,Arese Arena
HOME:  SG Arese U15
No.,Player Name,Points,Fouls,Time,+/-,Eff
4,Rossi M.,10,2,5:00,3,7
5,Bianchi L.,6,1,8:30,1,4
7,Colombo A.,0,0,0:00,0,0
Team Events,Timeouts,2";

    fn views() -> (TableView, ChartView) {
        let prepared = prepare_export(EXPORT.as_bytes(), "SG Arese U15")
            .unwrap()
            .expect("team block");
        let dataset = merge(Dataset::default(), prepared.table);
        let selection = FilterSelection::default();
        let rows = selection.filter(&dataset);
        let table = build_table_view(&dataset, &rows).unwrap();
        let chart = build_chart_view(&dataset, &rows, selection.aggregate_by_player()).unwrap();
        (table, chart)
    }

    #[test]
    fn writes_table_and_chart_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let (table, chart) = views();
        let path = default_export_path(dir.path());

        let report = export_views(&path, &table, Some(&chart)).unwrap();
        assert_eq!(report.path, path);
        assert_eq!(report.table_rows, 3);
        // Colombo never played and is not plotted.
        assert_eq!(report.chart_points, 2);
        assert!(path.exists());
        assert!(path.extension().is_some_and(|ext| ext == "xlsx"));
    }

    #[test]
    fn writes_players_sheet_without_chart() {
        let dir = tempfile::tempdir().unwrap();
        let (table, _) = views();
        let path = dir.path().join("players_only.xlsx");

        let report = export_views(&path, &table, None).unwrap();
        assert_eq!(report.table_rows, 3);
        assert_eq!(report.chart_points, 0);
        assert!(fs_len(&path) > 0);
    }

    fn fs_len(path: &Path) -> u64 {
        std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
    }
}
