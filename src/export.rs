use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::predict::{Market, Side, market_label};
use crate::state::{HistoryEntry, MatchView, league_key};

pub const CSV_FILE: &str = "scoutpredict_export.csv";
pub const XLSX_FILE: &str = "scoutpredict_export.xlsx";
pub const HISTORY_FILE: &str = "scoutpredict_history.json";

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone)]
pub struct ExportReport {
    pub path: PathBuf,
    pub matches: usize,
    pub rows: usize,
}

pub fn export_dir() -> PathBuf {
    env::var("SCOUT_EXPORT_DIR")
        .ok()
        .filter(|val| !val.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Header plus six rows per match: home markets then away markets.
pub fn prediction_rows(matches: &[&MatchView]) -> Vec<Vec<String>> {
    let mut rows = vec![vec![
        "League".to_string(),
        "Date".to_string(),
        "Match".to_string(),
        "Market".to_string(),
        "Team".to_string(),
        "Probability".to_string(),
    ]];
    for m in matches {
        let league = league_key(m.fixture.league).to_string();
        let date = m.fixture.kickoff.format(DATE_FORMAT).to_string();
        let title = m.fixture.title();
        for side in [Side::Home, Side::Away] {
            let team = &m.fixture.team(side).name;
            let probs = m.prediction.for_side(side);
            for market in Market::ALL {
                rows.push(vec![
                    league.clone(),
                    date.clone(),
                    title.clone(),
                    market_label(market).to_string(),
                    team.clone(),
                    format!("{}%", probs.get(market)),
                ]);
            }
        }
    }
    rows
}

pub struct CsvWriter<W: Write> {
    writer: W,
}

impl CsvWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::create(path).with_context(|| format!("create {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> CsvWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn append<R>(&mut self, record: R) -> Result<()>
    where
        R: IntoIterator,
        R::Item: AsRef<str>,
    {
        let mut first = true;
        for datum in record {
            if first {
                first = false;
            } else {
                self.writer.write_all(b",")?;
            }
            self.writer.write_all(quote(datum.as_ref()).as_bytes())?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Every cell is quoted; embedded quotes are doubled.
pub fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

pub fn export_csv(path: &Path, matches: &[&MatchView]) -> Result<ExportReport> {
    let rows = prediction_rows(matches);
    let mut csv = CsvWriter::create(path)?;
    for row in &rows {
        csv.append(row)
            .with_context(|| format!("write {}", path.display()))?;
    }
    csv.flush()
        .with_context(|| format!("flush {}", path.display()))?;

    Ok(ExportReport {
        path: path.to_path_buf(),
        matches: matches.len(),
        rows: rows.len().saturating_sub(1),
    })
}

pub fn export_xlsx(path: &Path, matches: &[&MatchView]) -> Result<ExportReport> {
    let rows = prediction_rows(matches);

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Predictions")?;
        write_rows(sheet, &rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        path: path.to_path_buf(),
        matches: matches.len(),
        rows: rows.len().saturating_sub(1),
    })
}

pub fn export_history_json(path: &Path, history: &[HistoryEntry]) -> Result<ExportReport> {
    let json = serde_json::to_string_pretty(history).context("serialize history")?;
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(ExportReport {
        path: path.to_path_buf(),
        matches: history.len(),
        rows: history.len(),
    })
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
