use super::{resolve_source, view_state, FilterArgs, SortArgs};
use crate::browser::BudgetBrowser;
use crate::error::Result;
use crate::loader;
use crate::settings::load_settings;

pub fn run(source: Option<&str>, filter: &FilterArgs, sort: &SortArgs) -> Result<()> {
    let state = view_state(filter, sort)?;
    let dataset = loader::load_dataset(&resolve_source(source));
    // A failed load still opens the browser; its status line shows the error
    // and `r` retries.
    let mut browser = BudgetBrowser::new(dataset, load_settings(), state);
    browser.run()
}
