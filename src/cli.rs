//! Command-line surface for upwatch.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "upwatch")]
#[command(about = "Single-endpoint uptime monitor with SQLite history")]
#[command(version)]
pub struct Cli {
    /// Configuration file path (YAML or JSON)
    #[arg(short, long, default_value = "monitor_config.yaml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate uptime reports from recorded history instead of monitoring
    Report {
        /// Report on a specific date (YYYY-MM-DD); defaults to yesterday
        #[arg(short, long, conflicts_with_all = ["days", "today"])]
        date: Option<NaiveDate>,

        /// Generate a report for each of the last N days
        #[arg(long)]
        days: Option<u32>,

        /// Report on today instead of yesterday
        #[arg(long)]
        today: bool,
    },
}
