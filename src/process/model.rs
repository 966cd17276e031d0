//! The process entity held by the tree store.

use once_cell::unsync::OnceCell;
use std::path::Path;

use crate::process::record::RawRecord;

/// One living process at snapshot time.
#[derive(Debug, Clone)]
pub struct Process {
    pub pid: u32,
    /// Parent pid, 0 when the process is a root of the OS forest.
    pub ppid: u32,
    /// Resident memory in KiB.
    pub rss_kb: u64,
    /// CPU time as a fraction of the process's elapsed lifetime.
    pub cpu_fraction: f64,
    pub name: String,
    pub(crate) children: Vec<u32>,
    pub(crate) accum_rss: OnceCell<u64>,
    pub(crate) accum_cpu: OnceCell<f64>,
}

impl Process {
    /// Builds a process from its raw record. `now_ticks` is the clock reading
    /// taken right after the record was read.
    pub fn from_record(record: RawRecord, page_size: u64, now_ticks: f64) -> Self {
        let rss_kb = record.rss_pages.saturating_mul(page_size) / 1024;
        let cpu_fraction = cpu_fraction(
            record.utime_ticks,
            record.stime_ticks,
            now_ticks,
            record.start_ticks,
        );
        let name = display_name(record.exe_path.as_deref(), &record.comm);

        Self {
            pid: record.pid,
            ppid: record.ppid,
            rss_kb,
            cpu_fraction,
            name,
            children: Vec::new(),
            accum_rss: OnceCell::new(),
            accum_cpu: OnceCell::new(),
        }
    }

    /// Child pids in their current order.
    pub fn children(&self) -> &[u32] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.ppid == 0
    }
}

/// `(user + kernel) / (now - start)`, or 0.0 when no time has elapsed.
///
/// The result is a rough approximation of lifetime CPU usage and can exceed
/// 1.0 for multi-threaded processes.
pub fn cpu_fraction(user_ticks: u64, kernel_ticks: u64, now_ticks: f64, start_ticks: u64) -> f64 {
    let elapsed = now_ticks - start_ticks as f64;
    if elapsed <= 0.0 || !elapsed.is_finite() {
        return 0.0;
    }
    (user_ticks as f64 + kernel_ticks as f64) / elapsed
}

/// Executable basename if resolvable, otherwise the raw command name.
pub fn display_name(exe_path: Option<&Path>, comm: &str) -> String {
    exe_path
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| comm.to_string())
}
