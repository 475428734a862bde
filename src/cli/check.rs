use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use super::{load, resolve_source};
use crate::error::Result;
use crate::fmt::{amount, delta};
use crate::reports::{self, NetDiscrepancy};

pub fn render(found: &[NetDiscrepancy<'_>], checked: usize, tolerance: f64) -> String {
    if found.is_empty() {
        return format!(
            "{} {checked} rows have Net = Senate - House (within {tolerance})",
            "OK".green().bold()
        );
    }
    let mut table = Table::new();
    table.set_header(vec!["Level", "Code", "Name", "Net", "Senate - House", "Difference"]);
    for d in found {
        table.add_row(vec![
            Cell::new(d.record.level.as_str()),
            Cell::new(d.record.display_code()),
            Cell::new(d.record.display_name()),
            Cell::new(amount(d.record.net)).set_alignment(CellAlignment::Right),
            Cell::new(amount(d.expected)).set_alignment(CellAlignment::Right),
            Cell::new(delta(d.difference).red()).set_alignment(CellAlignment::Right),
        ]);
    }
    format!(
        "{} {} of {checked} rows off by more than {tolerance}\n{table}",
        "MISMATCH".red().bold(),
        found.len()
    )
}

pub fn run(source: Option<&str>, tolerance: f64) -> Result<()> {
    let dataset = load(&resolve_source(source));
    let found = reports::net_discrepancies(&dataset.records, tolerance);
    println!("{}", render(&found, dataset.records.len(), tolerance));
    Ok(())
}
