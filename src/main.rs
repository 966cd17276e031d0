//! herakles-proc-tree - version 0.1.0
//!
//! Process tree viewer with tracing logging.
//! This is the main entry point that resolves configuration, takes one snapshot
//! of the process table and prints the tree to stdout.

mod cli;
mod config;
mod startup_checks;

use anyhow::Context;
use clap::Parser;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};

use cli::{Args, LogLevel};
use config::{resolve_config, show_config, validate_effective_config, Config};
use herakles_proc_tree::process::{ProcStatClock, ProcfsSource, SnapshotSource};
use herakles_proc_tree::{EnumerationReport, ProcessStore, TreeError, TreeRenderer};

/// Initializes tracing logging subsystem with configured log level.
/// Logs go to stderr so stdout carries only the tree.
fn setup_logging(args: &Args) {
    let log_level = match args.log_level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
    }

    debug!("Logging initialized with level: {:?}", args.log_level);
}

/// Builds the process store from the configured data source.
fn build_store(config: &Config) -> anyhow::Result<(ProcessStore, EnumerationReport)> {
    if let Some(path) = &config.test_data_file {
        let source = SnapshotSource::load(path)
            .with_context(|| format!("failed to load test data from {}", path.display()))?;
        return ProcessStore::build(&source, &source).context("failed to enumerate snapshot");
    }

    let proc_root = config.proc_root();
    if let Err(e) = startup_checks::validate_requirements(&proc_root) {
        anyhow::bail!("startup validation failed: {e}");
    }

    let source = ProcfsSource::new(&proc_root);
    let clock = ProcStatClock::new(&proc_root);
    ProcessStore::build(&source, &clock)
        .with_context(|| format!("failed to enumerate processes in {}", proc_root.display()))
}

fn run(args: &Args, config: &Config) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let options = config.render_options(stdout.is_terminal())?;

    let (mut store, report) = build_store(config)?;
    if !report.skipped.is_empty() {
        info!(
            "{} of {} pids skipped during enumeration",
            report.skipped.len(),
            report.listed
        );
    }

    let renderer = TreeRenderer::new(options);
    let mut out = BufWriter::new(stdout.lock());
    let lines = renderer.render(&mut store, &mut out)?;
    out.flush().context("failed to flush output")?;

    debug!(
        "Rendered {} lines from root {} ({} aggregates computed, log level {:?})",
        lines,
        options.root_pid,
        store.aggregation_count(),
        args.log_level
    );
    Ok(())
}

/// Main application entry point.
fn main() -> ExitCode {
    let args = Args::parse();
    let config = resolve_config(&args);

    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {e}");
        eprintln!("   Run with --help for usage.");
        return ExitCode::FAILURE;
    }

    if args.check_config {
        println!("✅ Configuration is valid");
        return ExitCode::SUCCESS;
    }

    if args.show_config {
        return match show_config(&config, args.config_format.clone()) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Failed to render configuration: {e}");
                ExitCode::FAILURE
            }
        };
    }

    setup_logging(&args);

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<TreeError>() {
                Some(TreeError::RootNotFound(pid)) => {
                    error!("Root pid {} not found in process tree", pid);
                    eprintln!("❌ No process with pid {pid} in the tree");
                }
                _ => eprintln!("❌ {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
