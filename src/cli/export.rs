use std::path::PathBuf;

use super::{load, resolve_source, view_state, FilterArgs, SortArgs};
use crate::error::Result;
use crate::export::{self, ExportFormat};
use crate::settings::{load_settings, shellexpand_path};

pub fn run(
    source: Option<&str>,
    filter_args: &FilterArgs,
    sort_args: &SortArgs,
    format: &str,
    output: Option<String>,
) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let state = view_state(filter_args, sort_args)?;
    let dataset = load(&resolve_source(source));
    let rows = export::rows_for(&dataset.records, &state);

    let path = match output {
        Some(p) => PathBuf::from(shellexpand_path(&p)),
        None => export::default_path(&load_settings().export_dir(), format),
    };
    export::write_export(&rows, format, &path)?;
    println!("Wrote {} ({} rows)", path.display(), rows.len());
    Ok(())
}
