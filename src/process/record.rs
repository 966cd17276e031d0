//! Raw process records and the capabilities that supply them.
//!
//! The tree builder never touches the operating system directly. It consumes
//! a [`RecordSource`] for per-process data and a [`ClockSource`] for the
//! elapsed-time basis of CPU fractions, so tests can feed synthetic graphs.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::TreeResult;

/// One process as reported by the record source, before any tree linking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub pid: u32,
    /// Parent pid, 0 for roots of the OS process forest.
    pub ppid: u32,
    /// Raw command name (`comm`).
    pub comm: String,
    /// Resident set size in pages.
    pub rss_pages: u64,
    /// User-mode ticks.
    pub utime_ticks: u64,
    /// Kernel-mode ticks.
    pub stime_ticks: u64,
    /// Ticks since boot at process creation.
    pub start_ticks: u64,
    /// Resolved executable path, when readable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exe_path: Option<PathBuf>,
}

/// Supplies raw process records on demand.
pub trait RecordSource {
    /// Every pid currently visible. Order is source-defined.
    fn list_pids(&self) -> TreeResult<Vec<u32>>;

    /// Reads the record for a single pid.
    fn read_record(&self, pid: u32) -> TreeResult<RawRecord>;

    /// Page size in bytes, used to convert `rss_pages` to KiB.
    fn page_size(&self) -> u64;
}

/// Supplies ticks elapsed since boot, averaged over processor cores.
pub trait ClockSource {
    fn ticks_since_boot(&self) -> TreeResult<f64>;
}
