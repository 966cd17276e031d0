//! Subtree aggregation of RSS and CPU fraction.
//!
//! Each process caches its accumulated values in a `OnceCell`, so an
//! aggregate of exactly zero is still a cached value and is never recomputed.

use crate::process::model::Process;
use crate::process::store::ProcessStore;

impl ProcessStore {
    /// RSS of `process` plus every descendant, in KiB.
    pub fn accumulated_rss(&self, process: &Process) -> u64 {
        *process.accum_rss.get_or_init(|| {
            self.record_aggregation();
            process.rss_kb
                + self
                    .child_processes(process)
                    .map(|child| self.accumulated_rss(child))
                    .sum::<u64>()
        })
    }

    /// CPU fraction of `process` plus every descendant.
    pub fn accumulated_cpu(&self, process: &Process) -> f64 {
        *process.accum_cpu.get_or_init(|| {
            self.record_aggregation();
            process.cpu_fraction
                + self
                    .child_processes(process)
                    .map(|child| self.accumulated_cpu(child))
                    .sum::<f64>()
        })
    }

    /// Number of aggregate values computed so far (cache misses).
    pub fn aggregation_count(&self) -> usize {
        self.aggregations.get()
    }

    fn record_aggregation(&self) {
        self.aggregations.set(self.aggregations.get() + 1);
    }

    fn child_processes<'a>(&'a self, process: &'a Process) -> impl Iterator<Item = &'a Process> {
        process.children.iter().filter_map(move |pid| self.get(*pid))
    }
}

#[cfg(test)]
mod tests {
    use crate::process::record::RawRecord;
    use crate::process::snapshot::SnapshotSource;
    use crate::process::store::ProcessStore;

    fn rec(pid: u32, ppid: u32, rss_kb: u64, cpu_ticks: u64) -> RawRecord {
        RawRecord {
            pid,
            ppid,
            comm: format!("p{pid}"),
            rss_pages: rss_kb,
            utime_ticks: cpu_ticks,
            stime_ticks: 0,
            start_ticks: 0,
            exe_path: None,
        }
    }

    fn build(records: Vec<RawRecord>) -> ProcessStore {
        // page size 1024 makes rss_pages equal to KiB; 100 ticks elapsed.
        let src = SnapshotSource::new(1024, 100.0, records);
        ProcessStore::build(&src, &src).unwrap().0
    }

    #[test]
    fn test_accumulated_rss_sums_subtree() {
        let store = build(vec![
            rec(1, 0, 100, 10),
            rec(2, 1, 50, 5),
            rec(3, 1, 30, 2),
            rec(4, 2, 7, 0),
        ]);
        let root = store.get(1).unwrap();
        assert_eq!(store.accumulated_rss(root), 187);
        assert_eq!(store.accumulated_rss(store.get(2).unwrap()), 57);
        assert!((store.accumulated_cpu(root) - 0.17).abs() < 1e-9);
    }

    #[test]
    fn test_zero_aggregate_is_cached() {
        let store = build(vec![rec(1, 0, 0, 0)]);
        let p = store.get(1).unwrap();

        assert_eq!(store.accumulated_cpu(p), 0.0);
        assert_eq!(store.accumulated_rss(p), 0);
        assert_eq!(store.aggregation_count(), 2);

        assert_eq!(store.accumulated_cpu(p), 0.0);
        assert_eq!(store.accumulated_rss(p), 0);
        assert_eq!(store.aggregation_count(), 2);
    }

    #[test]
    fn test_child_aggregates_reused_by_parent() {
        let store = build(vec![rec(1, 0, 1, 0), rec(2, 1, 1, 0), rec(3, 2, 1, 0)]);

        store.accumulated_rss(store.get(2).unwrap());
        assert_eq!(store.aggregation_count(), 2);

        // Only the root itself is new work.
        assert_eq!(store.accumulated_rss(store.get(1).unwrap()), 3);
        assert_eq!(store.aggregation_count(), 3);
    }
}
