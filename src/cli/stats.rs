use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use super::{load, resolve_source, FilterArgs};
use crate::error::Result;
use crate::filter;
use crate::fmt::{delta, money};
use crate::reports::{self, Totals, TotalsBasis};
use crate::settings::{load_settings, Settings};

fn basis_note(basis: &TotalsBasis) -> String {
    match basis {
        TotalsBasis::SummaryRow => "from the TOTAL_NEW_APPROPRIATIONS row".to_string(),
        TotalsBasis::Computed(level) => format!("summed over {level} rows"),
        TotalsBasis::Empty => "no rows".to_string(),
    }
}

pub fn render(totals: &Totals, counts: &[(String, usize)], settings: &Settings) -> String {
    let sym = &settings.currency_symbol;
    let mut table = Table::new();
    table.set_header(vec!["Total", "Amount"]);
    for (label, value, signed) in [
        ("House", totals.house, false),
        ("Senate", totals.senate, false),
        ("Increase", totals.increase, true),
        ("Decrease", totals.decrease, true),
        ("Net", totals.net, true),
    ] {
        let text = if signed { delta(value) } else { money(value, sym) };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(text).set_alignment(CellAlignment::Right),
        ]);
    }

    let mut levels = Table::new();
    levels.set_header(vec!["Level", "Rows"]);
    for (level, n) in counts {
        levels.add_row(vec![
            Cell::new(level),
            Cell::new(n).set_alignment(CellAlignment::Right),
        ]);
    }

    format!(
        "{} ({}, {})\n{table}\n\n{}\n{levels}",
        "Headline totals".bold(),
        settings.unit_label,
        basis_note(&totals.basis),
        "Rows by level".bold(),
    )
}

pub fn run(source: Option<&str>, filter_args: &FilterArgs) -> Result<()> {
    let settings = load_settings();
    let dataset = load(&resolve_source(source));
    let state = filter_args.view_state()?;
    let rows = filter::filter(&dataset.records, &state.search, state.level.as_ref());

    let totals = reports::totals(&rows);
    let counts = reports::level_counts(&rows);
    println!("{}", render(&totals, &counts, &settings));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::row;
    use crate::models::{Level, TOTAL_ROW_NAME};

    #[test]
    fn test_stats_use_total_row() {
        let mut total = row(Level::Summary, ("", TOTAL_ROW_NAME), ("", ""), ("", ""));
        total.house = 5000.0;
        total.senate = 5200.0;
        total.net = 200.0;
        let records = vec![total];
        let out = render(
            &reports::totals(&records),
            &reports::level_counts(&records),
            &Settings::default(),
        );
        assert!(out.contains("\u{20b1}5,200"));
        assert!(out.contains("+200"));
        assert!(out.contains("TOTAL_NEW_APPROPRIATIONS row"));
        assert!(out.contains("Summary"));
    }

    #[test]
    fn test_stats_empty() {
        let out = render(&reports::totals(&[]), &[], &Settings::default());
        assert!(out.contains("no rows"));
    }
}
