//! Herakles Process Tree Library
//!
//! This library builds a one-shot snapshot of the process forest, computes
//! per-process and subtree-accumulated resource usage, and renders the
//! hierarchy as text sorted by a chosen metric.
//!
//! # Features
//!
//! - **Order-independent tree building**: ancestors are resolved on demand,
//!   parent cycles in malformed data are rejected
//! - **Memoized aggregation**: accumulated RSS and CPU are computed once per process
//! - **Stable ordering**: ties keep enumeration order in both directions
//! - **Injectable sources**: `/proc`, JSON snapshots, or any custom `RecordSource`
//!
//! # Usage
//!
//! ```rust
//! use herakles_proc_tree::process::{ProcessStore, RawRecord, SnapshotSource};
//! use herakles_proc_tree::render::{RenderOptions, Style, TreeRenderer};
//!
//! let record = |pid: u32, ppid: u32, rss_pages: u64| RawRecord {
//!     pid,
//!     ppid,
//!     comm: format!("proc{pid}"),
//!     rss_pages,
//!     utime_ticks: 0,
//!     stime_ticks: 0,
//!     start_ticks: 0,
//!     exe_path: None,
//! };
//! let source = SnapshotSource::new(1024, 100.0, vec![record(1, 0, 100), record(2, 1, 50)]);
//!
//! let (mut store, _report) = ProcessStore::build(&source, &source).unwrap();
//! assert_eq!(store.accumulated_rss(store.get(1).unwrap()), 150);
//!
//! let renderer = TreeRenderer::new(RenderOptions {
//!     style: Style::Boring,
//!     ..Default::default()
//! });
//! let mut out = Vec::new();
//! renderer.render(&mut store, &mut out).unwrap();
//! println!("{}", String::from_utf8_lossy(&out));
//! ```

pub mod error;
pub mod process;
pub mod render;

// Re-export main types for convenience
pub use error::{TreeError, TreeResult};
pub use process::{
    ClockSource, EnumerationReport, Process, ProcessStore, RawRecord, RecordSource, SortMetric,
    SortOrder,
};
pub use render::{RenderOptions, Style, TreeRenderer};
