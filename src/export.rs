use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use tracing::info;

use crate::error::{BudgetError, Result};
use crate::filter;
use crate::models::Record;
use crate::sort;
use crate::view::ViewState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(BudgetError::UnknownFormat(s.to_string())),
        }
    }
}

/// Serialize rows as CSV with the dataset's own header row.
pub fn to_csv(records: &[Record]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    if records.is_empty() {
        wtr.write_record(crate::models::COLUMNS)?;
    }
    for r in records {
        wtr.serialize(r)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| BudgetError::Other(format!("CSV flush failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| BudgetError::Other(e.to_string()))
}

/// Serialize rows as a pretty-printed JSON array.
pub fn to_json(records: &[Record]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

pub fn serialize(records: &[Record], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Csv => to_csv(records),
        ExportFormat::Json => to_json(records),
    }
}

/// The rows an export writes: filtered, then ordered by the sort column
/// when one is set.
pub fn rows_for(records: &[Record], state: &ViewState) -> Vec<Record> {
    let mut rows = filter::filter(records, &state.search, state.level.as_ref());
    if let Some(s) = state.sort {
        sort::sort_records(&mut rows, s.key, s.direction);
    }
    rows
}

/// Date-stamped name: budget-export-2026-01-31.csv
pub fn default_file_name(format: ExportFormat, date: NaiveDate) -> String {
    format!("budget-export-{}.{}", date.format("%Y-%m-%d"), format.extension())
}

pub fn default_path(dir: &Path, format: ExportFormat) -> PathBuf {
    dir.join(default_file_name(format, chrono::Local::now().date_naive()))
}

pub fn write_export(records: &[Record], format: ExportFormat, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut body = serialize(records, format)?;
    if format == ExportFormat::Json {
        body.push('\n');
    }
    std::fs::write(path, body)?;
    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}
