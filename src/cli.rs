//! Command-line interface argument parsing for runlog.
//!
//! - `runlog add --distance 5000 --duration 1800 --start "2024-03-05 07:00:00"`
//! - `runlog list --date 2024-03-05`
//! - `runlog month --year 2024 --month 3`
//! - `runlog show`

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};

/// Environment variable overriding the default database location
pub const DB_ENV_VAR: &str = "RUNLOG_DB";

/// A local log of running sessions.
#[derive(Parser, Debug)]
#[command(name = "runlog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the SQLite database file.
    /// Defaults to $RUNLOG_DB, then <data dir>/runlog/runlog.db
    #[arg(long, global = true)]
    pub db_path: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record a completed run
    Add {
        /// Distance in meters
        #[arg(long)]
        distance: f64,

        /// Duration in seconds
        #[arg(long)]
        duration: i64,

        /// Start time, "YYYY-MM-DD HH:MM:SS"
        #[arg(long, value_parser = parse_timestamp)]
        start: NaiveDateTime,

        /// End time, defaults to start + duration
        #[arg(long, value_parser = parse_timestamp)]
        end: Option<NaiveDateTime>,

        /// Day the run counts towards, defaults to the start date
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Average speed, defaults to distance / duration
        #[arg(long)]
        avg_speed: Option<f64>,

        /// Identifier for the run, a fresh UUID when omitted
        #[arg(long)]
        uuid: Option<String>,
    },

    /// List recorded runs, newest first
    List {
        /// Only runs on this day (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Personal bests and totals
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Distance run today
    Today,

    /// Distance per day for one month
    Month {
        #[arg(long)]
        year: i32,

        /// 1-12
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: u32,

        #[arg(long)]
        json: bool,
    },

    /// Delete every recorded run
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Launch the terminal dashboard
    Show {
        /// Year of the month to open, defaults to the current one
        #[arg(long)]
        year: Option<i32>,

        /// Month to open, defaults to the current one
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| format!("expected \"YYYY-MM-DD HH:MM:SS\": {e}"))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

/// Configuration derived from CLI arguments and the environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        AppConfig {
            db_path: resolve_db_path(cli.db_path.clone(), std::env::var_os(DB_ENV_VAR)),
            log_level: cli.log_level.clone(),
        }
    }
}

/// Pick the database path: explicit flag, then environment, then the user data directory
fn resolve_db_path(flag: Option<PathBuf>, env: Option<std::ffi::OsString>) -> PathBuf {
    flag.or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("runlog")
                .join("runlog.db")
        })
}
