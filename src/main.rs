mod browser;
mod cli;
mod compare;
mod convert;
mod error;
mod export;
mod filter;
mod fmt;
mod hierarchy;
mod loader;
mod models;
mod reports;
mod settings;
mod sort;
mod tui;
mod view;

use clap::Parser;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, FilterArgs, SortArgs};

fn main() {
    let cli = Cli::parse();
    init_logger(cli.log_level);
    let source = cli.source.as_deref();

    let result = match cli.command {
        None => cli::browse::run(source, &FilterArgs::default(), &SortArgs::default()),
        Some(command) => match command {
            Commands::Table {
                filter,
                sort,
                collapsed,
            } => cli::table::run(source, &filter, &sort, collapsed),
            Commands::Browse { filter, sort } => cli::browse::run(source, &filter, &sort),
            Commands::Stats { filter } => cli::stats::run(source, &filter),
            Commands::Chart {
                level,
                sort,
                top,
                text,
            } => cli::chart::run(source, level.as_deref(), sort.as_deref(), top, text),
            Commands::Export {
                filter,
                sort,
                format,
                output,
            } => cli::export::run(source, &filter, &sort, &format, output),
            Commands::Check { tolerance } => cli::check::run(source, tolerance),
            Commands::Compare { old, new, limit } => cli::compare::run(&old, &new, limit),
            Commands::Convert {
                input,
                output,
                report_key,
            } => cli::convert::run(&input, output.as_deref(), report_key.as_deref()),
            Commands::Load { source } => cli::load::run(&source),
            Commands::Status => cli::status::run(source),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber.
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        // RUST_LOG exists; use it.
        Some(_) => EnvFilter::from_default_env(),
        // Otherwise only this program's events, at the requested level.
        None => EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
