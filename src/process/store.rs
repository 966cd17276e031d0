//! Process store: builds the parent/child forest from independently ordered records.
//!
//! Records may arrive in any order. When a process references a parent that
//! has not been materialized yet, the ancestor chain is walked upward until it
//! reaches pid 0 or an already-known process, then inserted top-down so every
//! child is linked to a parent that already exists.

use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use std::cell::Cell;
use tracing::{debug, info, warn};

use crate::error::{TreeError, TreeResult};
use crate::process::model::Process;
use crate::process::record::{ClockSource, RecordSource};

/// Outcome of a full enumeration pass.
#[derive(Debug, Default)]
pub struct EnumerationReport {
    /// Number of pids the source listed.
    pub listed: usize,
    /// Processes present in the store after the pass.
    pub processes: usize,
    /// Pids that could not be resolved, with the reason.
    pub skipped: Vec<(u32, TreeError)>,
}

/// Owns every [`Process`] of one snapshot, keyed by pid.
#[derive(Debug, Default)]
pub struct ProcessStore {
    procs: HashMap<u32, Process>,
    roots: Vec<u32>,
    pub(crate) aggregations: Cell<usize>,
}

impl ProcessStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enumerates every visible pid and builds the complete forest.
    pub fn build<S, C>(source: &S, clock: &C) -> TreeResult<(Self, EnumerationReport)>
    where
        S: RecordSource + ?Sized,
        C: ClockSource + ?Sized,
    {
        let mut store = Self::new();
        let report = store.enumerate_all(source, clock)?;
        Ok((store, report))
    }

    /// Returns the process for `pid`, reading it and any missing ancestors first.
    ///
    /// Nothing from a failing ancestor chain is inserted: if any ancestor is
    /// unreadable or the chain loops, the store is left unchanged.
    pub fn resolve<S, C>(&mut self, source: &S, clock: &C, pid: u32) -> TreeResult<&Process>
    where
        S: RecordSource + ?Sized,
        C: ClockSource + ?Sized,
    {
        if !self.procs.contains_key(&pid) {
            self.materialize(source, clock, pid)?;
        }
        self.procs.get(&pid).ok_or(TreeError::NotFound(pid))
    }

    fn materialize<S, C>(&mut self, source: &S, clock: &C, pid: u32) -> TreeResult<()>
    where
        S: RecordSource + ?Sized,
        C: ClockSource + ?Sized,
    {
        let page_size = source.page_size();
        let mut pending: Vec<Process> = Vec::new();
        let mut in_progress: HashSet<u32> = HashSet::new();
        let mut next = pid;

        loop {
            if !in_progress.insert(next) {
                let mut chain: Vec<u32> = pending.iter().map(|p| p.pid).collect();
                chain.push(next);
                return Err(TreeError::CycleDetected { pid, chain });
            }

            let record = source.read_record(next)?;
            // Read the clock right after the record for best accuracy.
            let now = clock.ticks_since_boot()?;
            let process = Process::from_record(record, page_size, now);
            let parent = process.ppid;

            debug!(
                "Read pid {} ({}) ppid={} rss={}KiB cpu={:.4}",
                process.pid, process.name, parent, process.rss_kb, process.cpu_fraction
            );
            pending.push(process);

            if parent == 0 || self.procs.contains_key(&parent) {
                break;
            }
            next = parent;
        }

        while let Some(process) = pending.pop() {
            self.insert(process);
        }
        Ok(())
    }

    fn insert(&mut self, process: Process) {
        let pid = process.pid;
        if process.is_root() {
            self.roots.push(pid);
        } else if let Some(parent) = self.procs.get_mut(&process.ppid) {
            parent.children.push(pid);
        }
        self.procs.insert(pid, process);
    }

    /// Resolves every pid the source lists. Individual failures are logged and
    /// collected; only a failure to list pids at all is returned as an error.
    pub fn enumerate_all<S, C>(&mut self, source: &S, clock: &C) -> TreeResult<EnumerationReport>
    where
        S: RecordSource + ?Sized,
        C: ClockSource + ?Sized,
    {
        let pids = source.list_pids()?;
        let mut report = EnumerationReport {
            listed: pids.len(),
            ..Default::default()
        };

        for pid in pids {
            if let Err(e) = self.resolve(source, clock, pid) {
                match &e {
                    TreeError::NotFound(_) => warn!("Skipping pid {}: process exited ({})", pid, e),
                    _ => warn!("Skipping pid {}: {}", pid, e),
                }
                report.skipped.push((pid, e));
            }
        }

        report.processes = self.procs.len();
        info!(
            "Enumerated {} pids: {} processes in tree, {} skipped",
            report.listed,
            report.processes,
            report.skipped.len()
        );
        Ok(report)
    }

    pub fn get(&self, pid: u32) -> Option<&Process> {
        self.procs.get(&pid)
    }

    pub(crate) fn procs_mut(&mut self, pid: u32) -> Option<&mut Process> {
        self.procs.get_mut(&pid)
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.procs.contains_key(&pid)
    }

    /// Like [`get`](Self::get) but fails with `RootNotFound`.
    pub fn root(&self, pid: u32) -> TreeResult<&Process> {
        self.procs.get(&pid).ok_or(TreeError::RootNotFound(pid))
    }

    /// Pids with no parent (ppid 0), in insertion order.
    pub fn roots(&self) -> &[u32] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.procs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.procs.values()
    }

    /// Pids of the subtree rooted at `pid`, pre-order, in current child order.
    pub fn subtree_pids(&self, pid: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut stack = vec![pid];
        while let Some(next) = stack.pop() {
            if let Some(process) = self.procs.get(&next) {
                out.push(next);
                stack.extend(process.children.iter().rev());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::record::RawRecord;
    use crate::process::snapshot::SnapshotSource;

    fn rec(pid: u32, ppid: u32, rss_pages: u64) -> RawRecord {
        RawRecord {
            pid,
            ppid,
            comm: format!("p{pid}"),
            rss_pages,
            utime_ticks: 1,
            stime_ticks: 1,
            start_ticks: 0,
            exe_path: None,
        }
    }

    fn source(records: Vec<RawRecord>) -> SnapshotSource {
        SnapshotSource::new(1024, 1000.0, records)
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let src = source(vec![rec(1, 0, 10)]);
        let mut store = ProcessStore::new();
        store.resolve(&src, &src, 1).unwrap();
        store.resolve(&src, &src, 1).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.roots(), &[1]);
    }

    #[test]
    fn test_children_listed_before_parents() {
        // Grandchild first, then child, then root.
        let src = source(vec![rec(3, 2, 1), rec(2, 1, 1), rec(1, 0, 1)]);
        let (store, report) = ProcessStore::build(&src, &src).unwrap();

        assert!(report.skipped.is_empty());
        assert_eq!(store.len(), 3);
        assert_eq!(store.get(1).unwrap().children(), &[2]);
        assert_eq!(store.get(2).unwrap().children(), &[3]);
        assert_eq!(store.roots(), &[1]);
    }

    #[test]
    fn test_each_process_linked_once() {
        let src = source(vec![
            rec(4, 2, 1),
            rec(1, 0, 1),
            rec(2, 1, 1),
            rec(3, 1, 1),
            rec(5, 2, 1),
        ]);
        let (store, _) = ProcessStore::build(&src, &src).unwrap();

        for process in store.iter() {
            let parents = store
                .iter()
                .filter(|p| p.children().contains(&process.pid))
                .count();
            let expected = if process.is_root() { 0 } else { 1 };
            assert_eq!(parents, expected, "pid {}", process.pid);
        }
        assert_eq!(store.subtree_pids(1), vec![1, 2, 4, 5, 3]);
    }

    #[test]
    fn test_cycle_detected() {
        let src = source(vec![rec(5, 7, 1), rec(7, 5, 1)]);
        let mut store = ProcessStore::new();
        let err = store.resolve(&src, &src, 5).unwrap_err();
        match err {
            TreeError::CycleDetected { pid, chain } => {
                assert_eq!(pid, 5);
                assert_eq!(chain, vec![5, 7, 5]);
            }
            other => panic!("expected CycleDetected, got {other:?}"),
        }
        assert!(store.is_empty());
    }

    #[test]
    fn test_self_parent_is_cycle() {
        let src = source(vec![rec(9, 9, 1)]);
        let mut store = ProcessStore::new();
        assert!(matches!(
            store.resolve(&src, &src, 9),
            Err(TreeError::CycleDetected { pid: 9, .. })
        ));
    }

    #[test]
    fn test_missing_ancestor_skips_descendant() {
        // pid 2's parent 50 is not in the source.
        let src = source(vec![rec(1, 0, 1), rec(2, 50, 1), rec(3, 1, 1)]);
        let (store, report) = ProcessStore::build(&src, &src).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, 2);
        assert!(matches!(report.skipped[0].1, TreeError::NotFound(50)));
    }

    #[test]
    fn test_root_lookup() {
        let src = source(vec![rec(1, 0, 1)]);
        let (store, _) = ProcessStore::build(&src, &src).unwrap();
        assert!(store.root(1).is_ok());
        assert!(matches!(store.root(42), Err(TreeError::RootNotFound(42))));
    }
}
