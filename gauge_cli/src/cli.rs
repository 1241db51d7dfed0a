//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

/// Keeps the non-blocking file writer alive so buffered lines flush at exit.
pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "gauge", version, about = "Battery gauge CLI")]
pub struct Cli {
    /// Path to config TOML
    #[arg(long, value_name = "FILE", default_value = "etc/gauge.toml")]
    pub config: PathBuf,

    /// Emit JSON (status output and structured errors)
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Simulated battery voltage in mV (simulation builds only)
    #[arg(long, value_name = "MV", default_value_t = 3700)]
    pub sim_mv: u16,

    /// Simulated droop in mV per read (simulation builds only)
    #[arg(long, value_name = "MV", default_value_t = 0)]
    pub sim_droop: i32,

    /// IIO device index (hardware builds only)
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub iio_device: u32,

    /// IIO voltage channel index (hardware builds only)
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub iio_channel: u32,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Take one forced reading and print the status line
    Status {
        /// Suppress the [LOW]/[CRITICAL] warning marker
        #[arg(long, action = ArgAction::SetTrue)]
        no_warnings: bool,
    },
    /// Run the tick loop and print a status line per tick until Ctrl-C
    Monitor {
        /// Stop after this many ticks (default: run until interrupted)
        #[arg(long, value_name = "N")]
        ticks: Option<u64>,
        /// Override the configured tick interval in milliseconds
        #[arg(long, value_name = "MS")]
        interval_ms: Option<u64>,
    },
    /// Correct the ADC reference against an external meter reading
    Calibrate {
        /// Pack voltage measured with a trusted meter, in millivolts
        #[arg(long, value_name = "MV")]
        measured_mv: u16,
        /// Print the corrected reference without persisting it
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
}
