//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Livesync - frame-accurate synchronization of timed data sources
#[derive(Parser, Debug)]
#[command(
    name = "livesync",
    author,
    version,
    about = "Timecode-driven multi-source synchronization",
    long_about = "Aligns timed data streams against a timecode clock.\n\n\
                  Loads a session from configuration, calibrates the presentation \n\
                  delay against simulated source latencies, and reports per-source \n\
                  synchronization statistics."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LIVESYNC_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "LIVESYNC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a synchronization session
    Run(RunArgs),

    /// Validate a session file without running
    Validate(ValidateArgs),

    /// Display session configuration
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to session file (TOML or JSON)
    #[arg(short, long, default_value = "session.toml", env = "LIVESYNC_CONFIG")]
    pub config: PathBuf,

    /// Override the number of frames to run from configuration
    #[arg(long, env = "LIVESYNC_FRAMES")]
    pub frames: Option<u64>,

    /// Override the presentation delay, in clock frames
    #[arg(long, env = "LIVESYNC_DELAY")]
    pub delay: Option<i32>,

    /// Skip the calibration pass even when the session enables it
    #[arg(long)]
    pub no_calibrate: bool,

    /// Pace ticks at the clock's frame rate instead of running flat out
    #[arg(long)]
    pub realtime: bool,

    /// Session timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "LIVESYNC_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Seed for simulated delivery jitter
    #[arg(long, default_value = "1", env = "LIVESYNC_SEED")]
    pub seed: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "LIVESYNC_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to session file to validate
    #[arg(short, long, default_value = "session.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to session file
    #[arg(short, long, default_value = "session.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed per-source information
    #[arg(long)]
    pub sources: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
