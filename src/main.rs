//! runlog: a local log of running sessions.
//!
//! Runs are kept in a SQLite file. Subcommands add and query them; `show`
//! opens a keyboard-driven terminal dashboard with today's distance, personal
//! records and a per-day chart of a month.

mod app;
mod cli;
mod commands;
mod data;
mod logging;
mod ui;

use std::io;

use anyhow::{Context, Result};
use chrono::Local;
use cli::{AppConfig, Cli, Commands};
use data::RecordStore;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    let config = AppConfig::from_cli(&cli);
    logging::init(&config.log_level);

    // One store for the whole process, closed explicitly on the way out
    let store = RecordStore::open(&config.db_path)
        .with_context(|| format!("Failed to open database: {:?}", config.db_path))?;

    let result = dispatch(&store, &config, cli.command);
    let closed = store.close().context("Failed to close database");
    result.and(closed)
}

fn dispatch(store: &RecordStore, config: &AppConfig, command: Commands) -> Result<()> {
    let mut out = io::stdout().lock();

    match command {
        Commands::Add {
            distance,
            duration,
            start,
            end,
            date,
            avg_speed,
            uuid,
        } => commands::add(
            store,
            commands::AddArgs {
                distance,
                duration,
                start,
                end,
                date,
                avg_speed,
                uuid,
            },
            &mut out,
        ),
        Commands::List { date, json } => commands::list(store, date, json, &mut out),
        Commands::Stats { json } => commands::stats(store, json, &mut out),
        Commands::Today => commands::today(store, Local::now().date_naive(), &mut out),
        Commands::Month { year, month, json } => commands::month(store, year, month, json, &mut out),
        Commands::Clear { yes } => commands::clear(store, yes, &mut out),
        Commands::Show { year, month } => {
            drop(out);
            app::run(store, config.db_path.display().to_string(), year, month)
        }
    }
}
