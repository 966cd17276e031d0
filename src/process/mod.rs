//! Process-related modules for record sources, tree building, aggregation and ordering.
//!
//! This module provides:
//! - `record`: Raw process records and the `RecordSource`/`ClockSource` capabilities
//! - `procfs`: Record and clock sources backed by /proc
//! - `snapshot`: Record and clock source backed by a JSON snapshot file
//! - `model`: The `Process` entity
//! - `store`: Pid-keyed process store and forest construction
//! - `aggregate`: Memoized subtree RSS/CPU accumulation
//! - `sort`: Stable child ordering by accumulated metric

pub mod aggregate;
pub mod model;
pub mod procfs;
pub mod record;
pub mod snapshot;
pub mod sort;
pub mod store;

// Re-export commonly used types
pub use model::{cpu_fraction, display_name, Process};
pub use procfs::{parse_stat, parse_ticks_since_boot, ProcStatClock, ProcfsSource, PAGE_SIZE};
pub use record::{ClockSource, RawRecord, RecordSource};
pub use snapshot::{SnapshotFile, SnapshotSource};
pub use sort::{SortMetric, SortOrder};
pub use store::{EnumerationReport, ProcessStore};
