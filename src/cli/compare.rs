use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::compare::{self, Comparison};
use crate::error::Result;
use crate::fmt::{amount, delta, truncate};
use crate::loader::{self, Source};
use crate::models::Record;
use crate::settings::load_settings;

fn listing(title: &str, rows: &[Record], limit: usize, name_width: usize) -> String {
    let mut out = format!("{title} ({})\n", rows.len());
    for r in rows.iter().take(limit) {
        out.push_str(&format!(
            "  {:<20} {:<10} {}  {}\n",
            r.level.as_str(),
            r.display_code(),
            truncate(r.display_name(), name_width),
            amount(r.senate)
        ));
    }
    if rows.len() > limit {
        out.push_str(&format!("  \u{2026} and {} more\n", rows.len() - limit));
    }
    out
}

pub fn render(cmp: &Comparison, limit: usize, name_width: usize) -> String {
    let mut out = format!(
        "{} added, {} removed, {} changed, {} unchanged\n\n",
        cmp.added.len(),
        cmp.removed.len(),
        cmp.changed.len(),
        cmp.unchanged
    );

    if !cmp.changed.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Level", "Code", "Name", "Old Senate", "New Senate", "Change", "%", "House change"]);
        for c in cmp.largest_changes(limit) {
            let d = c.senate_delta();
            let change = if d < 0.0 { delta(d).red() } else { delta(d).green() };
            let pct = c
                .pct_change()
                .map(|p| format!("{p:+.1}%"))
                .unwrap_or_else(|| "n/a".to_string());
            table.add_row(vec![
                Cell::new(c.new.level.as_str()),
                Cell::new(c.new.display_code()),
                Cell::new(truncate(c.new.display_name(), name_width)),
                Cell::new(amount(c.old.senate)).set_alignment(CellAlignment::Right),
                Cell::new(amount(c.new.senate)).set_alignment(CellAlignment::Right),
                Cell::new(change).set_alignment(CellAlignment::Right),
                Cell::new(pct).set_alignment(CellAlignment::Right),
                Cell::new(delta(c.house_delta())).set_alignment(CellAlignment::Right),
            ]);
        }
        out.push_str(&format!("{}\n{table}\n\n", "Largest Senate changes".bold()));
    }
    if !cmp.added.is_empty() {
        out.push_str(&listing("Added", &cmp.added, limit, name_width));
    }
    if !cmp.removed.is_empty() {
        out.push_str(&listing("Removed", &cmp.removed, limit, name_width));
    }
    out
}

/// Both inputs must load; an empty side would report every row as added
/// or removed.
pub fn run(old: &str, new: &str, limit: usize) -> Result<()> {
    let settings = load_settings();
    let old_rows = loader::try_load(&Source::parse(old))?;
    let new_rows = loader::try_load(&Source::parse(new))?;
    let cmp = compare::compare(&old_rows, &new_rows);
    print!("{}", render(&cmp, limit, settings.name_width));
    Ok(())
}
