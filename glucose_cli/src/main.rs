#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `glucose`: load a CGM reading history and report the current glucose status.

mod cli;
mod error_fmt;
mod pipeline;

use std::path::Path;

use clap::Parser;
use eyre::{Result, WrapErr, eyre};
use glucose_core::PipelineCfg;
use glucose_traits::SystemClock;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{EXIT_NO_STATUS, exit_code_for_error, format_error_json, humanize};
use crate::pipeline::AsOf;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    match run(cli) {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "command failed");
            if JSON_MODE.get().copied().unwrap_or(false) {
                eprintln!("{}", format_error_json(&e));
            } else {
                eprintln!("{}", humanize(&e));
            }
            std::process::exit(exit_code_for_error(&e));
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    color_eyre::install()?;
    let config = load_config(cli.config.as_deref())?;
    init_tracing(&cli, &config.logging)?;
    let cfg = PipelineCfg::from(&config);

    match cli.cmd {
        Commands::Status {
            readings,
            now,
            allow_old_data,
        } => {
            let status = match now {
                Some(ms) => pipeline::run_status(&readings, &cfg, AsOf(ms), allow_old_data)?,
                None => pipeline::run_status(&readings, &cfg, SystemClock, allow_old_data)?,
            };
            match status {
                Some(s) => {
                    println!("{}", pipeline::render_status(&s, cli.json)?);
                    Ok(0)
                }
                None => {
                    tracing::warn!(path = %readings.display(), "no status available");
                    println!("no status available");
                    Ok(EXIT_NO_STATUS)
                }
            }
        }
        Commands::Ingest { readings } => {
            let loaded = pipeline::load(&readings, &cfg)?;
            println!("{}", pipeline::render_report(&loaded.report, cli.json));
            Ok(0)
        }
        Commands::CheckConfig => {
            if cli.json {
                println!("{}", serde_json::json!({ "ok": true }));
            } else {
                println!("config ok");
            }
            Ok(0)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<glucose_config::Config> {
    let Some(path) = path else {
        return Ok(glucose_config::Config::default());
    };
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let config = glucose_config::load_toml(&text)
        .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?;
    config
        .validate()
        .wrap_err_with(|| format!("invalid configuration in {}", path.display()))?;
    Ok(config)
}

/// Console logs go to stderr so stdout stays machine-readable; `[logging] file`
/// adds a JSON-lines file writer with its own level.
fn init_tracing(cli: &Cli, logging: &glucose_config::Logging) -> Result<()> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .wrap_err("invalid --log-level")?;
    let console = if cli.json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter)
            .boxed()
    };

    let file = match logging.file.as_deref() {
        Some(file) => {
            let file = Path::new(file);
            let dir = file
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = file
                .file_name()
                .ok_or_else(|| eyre!("logging.file has no file name"))?;
            let appender = match logging.rotation.as_deref().unwrap_or("never") {
                "daily" => tracing_appender::rolling::daily(dir, name),
                "hourly" => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            let filter = EnvFilter::try_new(logging.level.as_deref().unwrap_or("info"))
                .wrap_err("invalid logging.level")?;
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| eyre!("init tracing: {e}"))
}
