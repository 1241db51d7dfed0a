#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![deny(clippy::all)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod cli;
mod commands;
mod error_fmt;

use std::time::Duration;

use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use cli::{Cli, Commands, FILE_GUARD};
use gauge_config::Config;

fn main() {
    let args = Cli::parse();
    color_eyre::install().ok();

    // Config is parsed before tracing comes up so the file sink can be
    // configured; any load problem is reported right after init.
    let (cfg, load_note) = commands::load_config(&args.config);
    init_tracing(&args, &cfg.logging);
    if let Some(note) = load_note {
        tracing::warn!("{note}");
    }

    if let Err(err) = run(&args, &cfg) {
        if args.json {
            eprintln!("{}", error_fmt::format_error_json(&err));
        } else {
            eprintln!("Error: {}", error_fmt::humanize(&err));
        }
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}

fn run(args: &Cli, cfg: &Config) -> eyre::Result<()> {
    let monitor = commands::build_monitor(args, cfg)?;
    match &args.cmd {
        Commands::Status { no_warnings } => commands::run_status(monitor, args.json, *no_warnings),
        Commands::Monitor { ticks, interval_ms } => commands::run_monitor(
            monitor,
            *ticks,
            interval_ms.map(Duration::from_millis),
            args.json,
        ),
        Commands::Calibrate {
            measured_mv,
            dry_run,
        } => commands::run_calibrate(monitor, *measured_mv, &args.config, *dry_run, args.json),
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Console logging on stderr plus an optional JSON-lines file sink from the
/// `[logging]` config table. The console level comes from --log-level, with
/// RUST_LOG taking precedence when set. The non-blocking writer guard lives
/// in FILE_GUARD so buffered lines flush at exit.
fn init_tracing(args: &Cli, logging: &gauge_config::Logging) {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(env_filter(&args.log_level));

    let file_layer = logging.file.as_deref().and_then(|path| {
        let path = std::path::Path::new(path);
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => std::path::Path::new("."),
        };
        let name = path
            .file_name()
            .map_or_else(|| "gauge.log".into(), |n| n.to_string_lossy().into_owned());
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "Warning: cannot create log directory {}: {e}; file logging disabled",
                dir.display()
            );
            return None;
        }
        let rotation = match logging.rotation.as_deref() {
            Some("daily") => Rotation::DAILY,
            Some("hourly") => Rotation::HOURLY,
            _ => Rotation::NEVER,
        };
        let appender = RollingFileAppender::new(rotation, dir, name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);

        let level = logging.level.as_deref().unwrap_or("info");
        Some(
            fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(env_filter(level)),
        )
    });

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();
}
