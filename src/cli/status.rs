use super::resolve_source;
use crate::error::Result;
use crate::loader;
use crate::reports;
use crate::settings::{load_settings, settings_file_exists, settings_path};

pub fn run(source: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let source = resolve_source(source);

    let settings_note = if settings_file_exists() { "" } else { " (not created yet, using defaults)" };
    println!("Settings:   {}{settings_note}", settings_path().display());
    println!("Source:     {source}");
    println!("Unit:       {}", settings.unit_label);
    println!("Export dir: {}", settings.export_dir().display());

    let dataset = loader::load_dataset(&source);
    println!();
    if let Some(err) = &dataset.load_error {
        println!("Dataset could not be loaded: {err}");
        println!("Run `budgetview load <csv-or-url>` to choose a dataset.");
        return Ok(());
    }

    println!("Rows:       {}", dataset.records.len());
    if dataset.is_empty() {
        println!("The dataset has a header but no rows.");
    }
    for (level, n) in reports::level_counts(&dataset.records) {
        println!("  {level:<22}{n}");
    }
    Ok(())
}
