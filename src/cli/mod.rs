pub mod browse;
pub mod chart;
pub mod check;
pub mod compare;
pub mod convert;
pub mod export;
pub mod load;
pub mod stats;
pub mod status;
pub mod table;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::filter::LevelFilter;

use crate::error::Result;
use crate::loader::{self, Dataset, Source};
use crate::models::Level;
use crate::settings::load_settings;
use crate::sort::{SortDirection, SortKey, SortState, DEFAULT_DIRECTION};
use crate::view::ViewState;

#[derive(Parser)]
#[command(name = "budgetview", about = "Browse and report on national budget allocation CSVs.")]
pub struct Cli {
    /// CSV path or http(s) URL (default: the source saved with `budgetview load`)
    #[arg(long, global = true, env = "BUDGETVIEW_SOURCE")]
    pub source: Option<String>,

    /// Log level for this program; RUST_LOG takes precedence when set
    #[arg(long = "log-level", global = true, default_value_t = LevelFilter::INFO)]
    pub log_level: LevelFilter,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the department tree as a table.
    Table {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        sort: SortArgs,
        /// Show department rows only
        #[arg(long)]
        collapsed: bool,
    },
    /// Interactively browse the department tree.
    Browse {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        sort: SortArgs,
    },
    /// Headline totals and row counts per level.
    Stats {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Bar chart of the largest rows at one level.
    Chart {
        /// Level to chart (default: Department)
        #[arg(long)]
        level: Option<String>,
        /// Amount column: senate, house, increase, decrease, net
        #[arg(long)]
        sort: Option<String>,
        /// Bars before the rest fold into "Others" (default: settings top_n)
        #[arg(long)]
        top: Option<usize>,
        /// Print text bars even on a terminal
        #[arg(long)]
        text: bool,
    },
    /// Write the filtered rows to CSV or JSON.
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        sort: SortArgs,
        /// Output format: csv or json
        #[arg(long, default_value = "csv")]
        format: String,
        /// Output path (default: <export_dir>/budget-export-YYYY-MM-DD.<ext>)
        #[arg(long)]
        output: Option<String>,
    },
    /// List rows whose Net differs from Senate minus House.
    Check {
        /// Largest difference still accepted
        #[arg(long, default_value_t = crate::reports::DEFAULT_NET_TOLERANCE)]
        tolerance: f64,
    },
    /// Compare two budget years.
    Compare {
        /// Earlier dataset (path or URL)
        old: String,
        /// Later dataset (path or URL)
        new: String,
        /// Changed rows to list
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Flatten a committee report JSON into budget CSV.
    Convert {
        /// Report JSON file
        input: String,
        /// Output CSV (default: INPUT with a .csv extension)
        output: Option<String>,
        /// Top-level key holding the report (default: the first object)
        #[arg(long = "report-key")]
        report_key: Option<String>,
    },
    /// Save a dataset as the default source.
    Load {
        /// CSV path or http(s) URL
        source: String,
    },
    /// Show settings and a summary of the current dataset.
    Status,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Case-insensitive substring of department, agency or sub-agency names
    #[arg(long)]
    pub search: Option<String>,
    /// Only rows at this level (e.g. Department, Agency, Sub-Agency)
    #[arg(long)]
    pub level: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SortArgs {
    /// Order departments by: senate, house, increase, decrease, net
    #[arg(long)]
    pub sort: Option<String>,
    /// Ascending order
    #[arg(long, conflicts_with = "desc")]
    pub asc: bool,
    /// Descending order (the default)
    #[arg(long)]
    pub desc: bool,
}

impl FilterArgs {
    pub fn view_state(&self) -> Result<ViewState> {
        let level = parse_level(self.level.as_deref())?;
        Ok(ViewState::default()
            .with_search(self.search.clone().unwrap_or_default())
            .with_level(level))
    }
}

impl SortArgs {
    pub fn sort_state(&self) -> Result<Option<SortState>> {
        let Some(key) = &self.sort else {
            return Ok(None);
        };
        let key: SortKey = key.parse()?;
        let direction = if self.asc {
            SortDirection::Asc
        } else if self.desc {
            SortDirection::Desc
        } else {
            DEFAULT_DIRECTION
        };
        Ok(Some(SortState { key, direction }))
    }
}

/// Combine filter and sort flags into the state the views derive from.
pub(crate) fn view_state(filter: &FilterArgs, sort: &SortArgs) -> Result<ViewState> {
    Ok(filter.view_state()?.with_sort(sort.sort_state()?))
}

pub(crate) fn parse_level(raw: Option<&str>) -> Result<Option<Level>> {
    raw.map(str::parse::<Level>).transpose()
}

/// The `--source` flag, else the saved default.
pub(crate) fn resolve_source(flag: Option<&str>) -> Source {
    match flag {
        Some(s) => Source::parse(s),
        None => Source::parse(&load_settings().source),
    }
}

/// Load for a one-shot command; a failed load is reported and the command
/// carries on with no rows.
pub(crate) fn load(source: &Source) -> Dataset {
    let dataset = loader::load_dataset(source);
    if let Some(err) = &dataset.load_error {
        eprintln!("Could not load {source}: {err}");
    }
    dataset
}
