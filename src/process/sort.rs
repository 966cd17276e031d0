//! Stable ordering of a process's children by an accumulated metric.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::TreeError;
use crate::process::model::Process;
use crate::process::store::ProcessStore;

/// Accumulated metric that drives child ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMetric {
    #[default]
    Rss,
    Cpu,
}

impl FromStr for SortMetric {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rss" => Ok(SortMetric::Rss),
            "cpu" => Ok(SortMetric::Cpu),
            _ => Err(TreeError::InvalidOption {
                option: "sort",
                value: s.to_string(),
                expected: "rss, cpu",
            }),
        }
    }
}

impl fmt::Display for SortMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortMetric::Rss => write!(f, "rss"),
            SortMetric::Cpu => write!(f, "cpu"),
        }
    }
}

/// Metric plus direction. Ascending unless `reverse` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortOrder {
    pub metric: SortMetric,
    pub reverse: bool,
}

impl SortOrder {
    pub fn new(metric: SortMetric, reverse: bool) -> Self {
        Self { metric, reverse }
    }

    /// Compares two processes by their accumulated metric.
    ///
    /// Reversal flips `Less`/`Greater` only; ties stay `Equal`, so a stable
    /// sort keeps tied processes in insertion order in both directions.
    pub fn compare(&self, store: &ProcessStore, a: &Process, b: &Process) -> Ordering {
        let ord = match self.metric {
            SortMetric::Rss => store.accumulated_rss(a).cmp(&store.accumulated_rss(b)),
            SortMetric::Cpu => store.accumulated_cpu(a).total_cmp(&store.accumulated_cpu(b)),
        };
        if self.reverse {
            ord.reverse()
        } else {
            ord
        }
    }
}

impl ProcessStore {
    /// Reorders the children of `pid` in place with a stable sort.
    pub fn sort_children(&mut self, pid: u32, order: SortOrder) {
        let mut children = match self.procs_mut(pid) {
            Some(p) => std::mem::take(&mut p.children),
            None => return,
        };

        let store: &ProcessStore = self;
        children.sort_by(|a, b| match (store.get(*a), store.get(*b)) {
            (Some(a), Some(b)) => order.compare(store, a, b),
            _ => Ordering::Equal,
        });

        if let Some(p) = self.procs_mut(pid) {
            p.children = children;
        }
    }
}
