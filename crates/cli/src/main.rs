// sheets - modal terminal spreadsheet over CSV files

mod exit_codes;
mod tui;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use sheets_cli::session::Session;
use sheets_config::Settings;
use sheets_engine::{Bounds, Grid};
use tracing_appender::non_blocking::WorkerGuard;

use exit_codes::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

/// Environment variable holding the log filter, e.g. `debug` or
/// `sheets_engine=debug`. Logging is off when unset.
const LOG_ENV: &str = "SHEETS_LOG";

#[derive(Parser)]
#[command(name = "sheets")]
#[command(about = "Modal terminal spreadsheet (CSV files, vi-style keys)")]
#[command(long_version = long_version())]
#[command(version, disable_version_flag = true)]
struct Cli {
    /// CSV file to open; created on the first :w if it does not exist
    file: Option<PathBuf>,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

/// Install a file logger when `SHEETS_LOG` is set. Records from the `log`
/// facade used by the library crates are bridged in. The returned guard
/// flushes the writer on drop.
fn init_logging() -> Option<WorkerGuard> {
    let directive = std::env::var(LOG_ENV).ok()?;
    let filter = tracing_subscriber::EnvFilter::try_new(directive).ok()?;

    let log_dir = dirs::cache_dir()
        .map(|dir| dir.join("sheets"))
        .filter(|dir| std::fs::create_dir_all(dir).is_ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let file_appender = tracing_appender::rolling::never(&log_dir, "sheets.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "sheets starting");
    Some(guard)
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version also arrive here, on stdout.
            let _ = e.print();
            let code = if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS };
            return ExitCode::from(code);
        }
    };

    let _log_guard = init_logging();
    let settings = Settings::load();
    let separator = settings.separator_byte().unwrap_or(b',');

    let grid = match Grid::new(Bounds::new(settings.rows, settings.cols)) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("sheets: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut session = Session::new(grid, separator);
    if let Some(path) = &cli.file {
        if let Err(e) = session.load(path) {
            eprintln!("sheets: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    }

    match tui::run(&mut session, settings.column_width) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            log::error!("{}", e);
            eprintln!("sheets: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
