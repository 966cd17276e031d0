//! CLI arguments for herakles-proc-tree.
//!
//! This module defines the command-line interface structure using the clap library.
//! `--sort` and `--style` are taken as plain strings and validated together with
//! the rest of the effective configuration.

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-proc-tree",
    about = "Process tree with per-process and accumulated RSS/CPU usage",
    long_about = "Process tree with per-process and accumulated RSS/CPU usage.\n\n\
                  Takes a single snapshot of all visible processes, rebuilds the \
                  parent/child hierarchy and prints it sorted by accumulated \
                  memory or CPU usage of each subtree.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0",
    after_help = "Project: https://github.com/cansp-dev/herakles-proc-tree — More info: https://www.herakles.now"
)]
pub struct Args {
    /// Include RSS columns
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    pub rss: bool,

    /// Include CPU columns
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    pub cpu: bool,

    /// Accumulated metric used to order children (rss|cpu)
    #[arg(long, default_value = "rss")]
    pub sort: String,

    /// Invert the sort direction
    #[arg(long)]
    pub reverse: bool,

    /// Pid to use as the root of the printed tree
    #[arg(long, default_value_t = 1)]
    pub root: u32,

    /// Output style (fancy|boring|auto)
    #[arg(long, default_value = "auto")]
    pub style: String,

    /// Mount point of the proc filesystem
    #[arg(long, default_value = "/proc")]
    pub proc_root: PathBuf,

    /// Path to JSON snapshot file (uses recorded data instead of /proc)
    #[arg(short = 't', long)]
    pub test_data_file: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Print effective config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}
