use crate::error::{BudgetError, Result};
use crate::loader::{self, Source};
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path};

/// Local paths are stored expanded so the saved source works from any
/// directory; URLs are stored as given.
fn normalize(raw: &str) -> String {
    match Source::parse(raw) {
        Source::Url(url) => url,
        Source::Path(_) => {
            let expanded = std::path::PathBuf::from(shellexpand_path(raw));
            std::fs::canonicalize(&expanded)
                .unwrap_or(expanded)
                .to_string_lossy()
                .to_string()
        }
    }
}

pub fn run(raw: &str) -> Result<()> {
    let stored = normalize(raw);
    let source = Source::parse(&stored);

    let records = loader::try_load(&source).map_err(|e| {
        BudgetError::Settings(format!("Could not load {source}: {e}\nThe default source was not changed."))
    })?;

    let mut settings = load_settings();
    settings.source = stored;
    save_settings(&settings)?;

    println!("Default source is now {source} ({} rows)", records.len());
    println!("Saved to {}", settings_path().display());
    Ok(())
}
