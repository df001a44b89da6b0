//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "glucose", version, about = "CGM glucose status pipeline")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print results and errors as JSON instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "warn")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a reading history and print the current glucose status
    Status {
        /// Reading history CSV (timestamp,value,sensor[,filled_gap[,nightscout_id]])
        #[arg(long, value_name = "FILE")]
        readings: PathBuf,
        /// Evaluate as of this epoch millisecond instead of the system clock
        #[arg(long, value_name = "MS")]
        now: Option<i64>,
        /// Report a status even when the newest reading is stale
        #[arg(long, action = ArgAction::SetTrue)]
        allow_old_data: bool,
    },
    /// Ingest a reading history and print what the store changed
    Ingest {
        #[arg(long, value_name = "FILE")]
        readings: PathBuf,
    },
    /// Parse and validate the config, then exit
    CheckConfig,
}
