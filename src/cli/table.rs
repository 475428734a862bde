use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use super::{load, resolve_source, view_state, FilterArgs, SortArgs};
use crate::error::Result;
use crate::fmt::{amount, delta, truncate};
use crate::reports::{self, Totals};
use crate::settings::{load_settings, Settings};
use crate::view::{self, VisibleRow};

const HEADERS: [&str; 7] = ["Name", "Code", "House", "Increase", "Decrease", "Net", "Senate"];

fn right(text: impl std::fmt::Display) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn signed(val: f64) -> Cell {
    let text = delta(val);
    let colored = if val > 0.0 {
        text.green()
    } else if val < 0.0 {
        text.red()
    } else {
        text.normal()
    };
    right(colored)
}

fn name_cell(row: &VisibleRow, width: usize) -> Cell {
    let marker = match (row.expandable, row.expanded) {
        (false, _) => "  ",
        (true, true) => "\u{25be} ",
        (true, false) => "\u{25b8} ",
    };
    let text = format!(
        "{}{marker}{}",
        "  ".repeat(row.depth),
        truncate(row.record.display_name(), width)
    );
    if row.placeholder {
        Cell::new(text.dimmed().italic())
    } else if row.depth == 0 {
        Cell::new(text.bold())
    } else {
        Cell::new(text)
    }
}

/// Render the visible rows plus a totals footer.
pub fn render(rows: &[VisibleRow], totals: &Totals, settings: &Settings) -> String {
    let mut table = Table::new();
    table.set_header(HEADERS.to_vec());

    for row in rows {
        let r = &row.record;
        table.add_row(vec![
            name_cell(row, settings.name_width),
            Cell::new(r.display_code()),
            right(amount(r.house)),
            signed(r.increase),
            signed(r.decrease),
            signed(r.net),
            right(amount(r.senate)),
        ]);
    }

    table.add_row(vec![
        Cell::new("TOTAL".bold()),
        Cell::new(""),
        right(amount(totals.house)),
        signed(totals.increase),
        signed(totals.decrease),
        signed(totals.net),
        right(amount(totals.senate).bold()),
    ]);

    format!("Amounts in {}\n{table}", settings.unit_label)
}

pub fn run(source: Option<&str>, filter: &FilterArgs, sort: &SortArgs, collapsed: bool) -> Result<()> {
    let settings = load_settings();
    let dataset = load(&resolve_source(source));
    let mut state = view_state(filter, sort)?;

    // Expansion keys come from the tree of the filtered rows.
    let derived = view::derive(&dataset.records, &state);
    if !collapsed {
        state = state.expand_all(&derived.tree);
    }
    let rows = view::visible_rows(&derived.tree, &state);
    let totals = reports::totals(&derived.filtered);

    if rows.is_empty() {
        println!("No rows match.");
        return Ok(());
    }
    println!("{}", render(&rows, &totals, &settings));
    let filters = state.describe();
    if !filters.is_empty() {
        println!("{}", filters.dimmed());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{agency, dept, sub_agency};
    use crate::view::ViewState;

    #[test]
    fn test_render_indents_children_and_adds_totals() {
        let records = vec![
            dept("01", "Health", 1500.0),
            agency("01", "01A", "Hospitals", 900.0),
            sub_agency("01", "01A", "01A1", "Regional Hospital"),
        ];
        let derived = view::derive(&records, &ViewState::default());
        let state = ViewState::default().expand_all(&derived.tree);
        let rows = view::visible_rows(&derived.tree, &state);
        let totals = reports::totals(&derived.filtered);
        let out = render(&rows, &totals, &Settings::default());

        assert!(out.starts_with("Amounts in Thousand Pesos"));
        assert!(out.contains("Health"));
        assert!(out.contains("    Regional Hospital"));
        assert!(out.contains("1,500"));
        assert!(out.contains("TOTAL"));
    }

    #[test]
    fn test_render_truncates_long_names() {
        let records = vec![dept("01", "Department of Public Works and Highways", 1.0)];
        let derived = view::derive(&records, &ViewState::default());
        let settings = Settings {
            name_width: 12,
            ..Settings::default()
        };
        let out = render(&derived.rows, &reports::totals(&records), &settings);
        assert!(out.contains("Department \u{2026}") || out.contains("Department\u{2026}"));
        assert!(!out.contains("Highways"));
    }
}
