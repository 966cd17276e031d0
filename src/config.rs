//! Configuration management for herakles-proc-tree.
//!
//! The effective configuration is built from CLI arguments on top of defaults.
//! It can be printed in YAML, JSON, or TOML and is validated before any process
//! data is read, so option errors never produce partial output.

use crate::cli::{Args, ConfigFormat};
use herakles_proc_tree::process::procfs::DEFAULT_PROC_ROOT;
use herakles_proc_tree::{RenderOptions, SortMetric, SortOrder, Style, TreeError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// Default configuration constants
pub const DEFAULT_ROOT_PID: u32 = 1;

/// Effective configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Columns
    pub show_rss: Option<bool>,
    pub show_cpu: Option<bool>,

    // Ordering
    /// "rss" | "cpu"
    pub sort: Option<String>,
    pub reverse: Option<bool>,

    // Tree
    pub root_pid: Option<u32>,
    /// "fancy" | "boring" | "auto"
    pub style: Option<String>,

    // Data sources
    pub proc_root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_data_file: Option<PathBuf>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            show_rss: Some(true),
            show_cpu: Some(true),
            sort: Some(SortMetric::default().to_string()),
            reverse: Some(false),
            root_pid: Some(DEFAULT_ROOT_PID),
            style: Some(Style::default().to_string()),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            test_data_file: None,
            log_level: Some("warn".to_string()),
        }
    }
}

impl Config {
    pub fn sort_metric(&self) -> Result<SortMetric, TreeError> {
        self.sort.as_deref().map_or(Ok(SortMetric::default()), str::parse)
    }

    pub fn style(&self) -> Result<Style, TreeError> {
        self.style.as_deref().map_or(Ok(Style::default()), str::parse)
    }

    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    /// Builds renderer options. `is_terminal` is only consulted for `auto` style.
    pub fn render_options(&self, is_terminal: bool) -> Result<RenderOptions, TreeError> {
        Ok(RenderOptions {
            show_rss: self.show_rss.unwrap_or(true),
            show_cpu: self.show_cpu.unwrap_or(true),
            order: SortOrder::new(self.sort_metric()?, self.reverse.unwrap_or(false)),
            root_pid: self.root_pid.unwrap_or(DEFAULT_ROOT_PID),
            style: self.style()?,
            is_terminal,
        })
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), TreeError> {
    cfg.sort_metric()?;
    cfg.style()?;
    Ok(())
}

/// Resolves configuration from CLI args and defaults.
pub fn resolve_config(args: &Args) -> Config {
    Config {
        show_rss: Some(args.rss),
        show_cpu: Some(args.cpu),
        sort: Some(args.sort.clone()),
        reverse: Some(args.reverse),
        root_pid: Some(args.root),
        style: Some(args.style.clone()),
        proc_root: Some(args.proc_root.clone()),
        // Test data file: replaces /proc when provided
        test_data_file: args.test_data_file.clone(),
        log_level: Some(format!("{:?}", args.log_level).to_lowercase()),
    }
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> anyhow::Result<()> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };

    println!("{output}");
    Ok(())
}
