//! JSON process-table snapshots used in place of a live `/proc`.
//!
//! A snapshot file carries everything both capabilities need:
//!
//! ```json
//! {
//!   "page_size": 4096,
//!   "ticks_since_boot": 100000.0,
//!   "records": [
//!     { "pid": 1, "ppid": 0, "comm": "init", "rss_pages": 25,
//!       "utime_ticks": 10, "stime_ticks": 5, "start_ticks": 1 }
//!   ]
//! }
//! ```

use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{TreeError, TreeResult};
use crate::process::record::{ClockSource, RawRecord, RecordSource};

fn default_page_size() -> u64 {
    4096
}

/// On-disk layout of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    pub ticks_since_boot: f64,
    pub records: Vec<RawRecord>,
}

/// In-memory record and clock source backed by a snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    page_size: u64,
    ticks_since_boot: f64,
    order: Vec<u32>,
    records: HashMap<u32, RawRecord>,
}

impl SnapshotSource {
    /// Builds a source from records in enumeration order.
    /// A later record with a duplicate pid replaces the earlier one.
    pub fn new(page_size: u64, ticks_since_boot: f64, records: Vec<RawRecord>) -> Self {
        let mut order = Vec::with_capacity(records.len());
        let mut map = HashMap::with_capacity(records.len());
        for record in records {
            let pid = record.pid;
            if map.insert(pid, record).is_none() {
                order.push(pid);
            }
        }
        Self {
            page_size,
            ticks_since_boot,
            order,
            records: map,
        }
    }

    /// Loads a snapshot from a JSON file.
    pub fn load(path: &Path) -> TreeResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| TreeError::Io {
            context: format!("failed to read snapshot {}", path.display()),
            source: e,
        })?;
        let file: SnapshotFile = serde_json::from_str(&content).map_err(|e| TreeError::Io {
            context: format!("failed to parse snapshot {}", path.display()),
            source: e.into(),
        })?;
        info!(
            "Loaded snapshot with {} records from: {}",
            file.records.len(),
            path.display()
        );
        Ok(Self::from(file))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl From<SnapshotFile> for SnapshotSource {
    fn from(file: SnapshotFile) -> Self {
        Self::new(file.page_size, file.ticks_since_boot, file.records)
    }
}

impl RecordSource for SnapshotSource {
    fn list_pids(&self) -> TreeResult<Vec<u32>> {
        Ok(self.order.clone())
    }

    fn read_record(&self, pid: u32) -> TreeResult<RawRecord> {
        self.records
            .get(&pid)
            .cloned()
            .ok_or(TreeError::NotFound(pid))
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }
}

impl ClockSource for SnapshotSource {
    fn ticks_since_boot(&self) -> TreeResult<f64> {
        Ok(self.ticks_since_boot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(pid: u32, ppid: u32) -> RawRecord {
        RawRecord {
            pid,
            ppid,
            comm: format!("proc{pid}"),
            rss_pages: 1,
            utime_ticks: 0,
            stime_ticks: 0,
            start_ticks: 0,
            exe_path: None,
        }
    }

    #[test]
    fn test_snapshot_preserves_order_and_answers_not_found() {
        let source = SnapshotSource::new(4096, 10.0, vec![record(3, 1), record(1, 0)]);
        assert_eq!(source.list_pids().unwrap(), vec![3, 1]);
        assert_eq!(source.read_record(1).unwrap().comm, "proc1");
        assert!(matches!(source.read_record(9), Err(TreeError::NotFound(9))));
        assert_eq!(source.ticks_since_boot().unwrap(), 10.0);
    }

    #[test]
    fn test_load_snapshot_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("snapshot.json");
        std::fs::write(
            &path,
            r#"{
                "ticks_since_boot": 5000.0,
                "records": [
                    {"pid": 1, "ppid": 0, "comm": "init", "rss_pages": 25,
                     "utime_ticks": 10, "stime_ticks": 5, "start_ticks": 1,
                     "exe_path": "/sbin/init"}
                ]
            }"#,
        )
        .expect("Failed to write snapshot");

        let source = SnapshotSource::load(&path).expect("load snapshot");
        assert_eq!(source.len(), 1);
        assert_eq!(source.page_size(), 4096);
        let init = source.read_record(1).unwrap();
        assert_eq!(init.exe_path.as_deref(), Some(Path::new("/sbin/init")));
    }

    #[test]
    fn test_load_snapshot_invalid_json() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            SnapshotSource::load(&path),
            Err(TreeError::Io { .. })
        ));
    }
}
