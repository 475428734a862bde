use std::path::{Path, PathBuf};

use crate::convert::{self, DEFAULT_UNIT};
use crate::error::Result;
use crate::export::{self, ExportFormat};

fn default_output(input: &Path) -> PathBuf {
    input.with_extension("csv")
}

pub fn run(input: &str, output: Option<&str>, report_key: Option<&str>) -> Result<()> {
    let input = Path::new(input);
    let json = std::fs::read_to_string(input)?;
    let report = convert::flatten_str(&json, report_key)?;

    let output = output.map(PathBuf::from).unwrap_or_else(|| default_output(input));
    export::write_export(&report.records, ExportFormat::Csv, &output)?;

    let unit = report.unit.as_deref().unwrap_or(DEFAULT_UNIT);
    println!(
        "Wrote {} rows from {} to {} (amounts in {unit})",
        report.records.len(),
        report.report_key,
        output.display()
    );
    Ok(())
}
