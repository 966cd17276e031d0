//! Linux `/proc` implementations of the record and clock sources.
//!
//! Record layout follows `proc(5)`: `/proc/<pid>/stat` holds the command name in
//! parentheses followed by space-separated fields. The command name may itself
//! contain spaces and parentheses, so fields are split after the last `)`.

use once_cell::sync::Lazy;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{TreeError, TreeResult};
use crate::process::record::{ClockSource, RawRecord, RecordSource};

/// Default mount point of the proc filesystem.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

fn get_page_size() -> u64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_PAGESIZE
        // Returns -1 on error, handled by the > 0 check
        unsafe {
            let size = libc::sysconf(libc::_SC_PAGESIZE);
            if size > 0 {
                return size as u64;
            }
        }
    }
    4096
}

/// System page size in bytes.
pub static PAGE_SIZE: Lazy<u64> = Lazy::new(get_page_size);

// Zero-based indices into the fields following the closing parenthesis.
// Field numbers in proc(5) are 1-based and start counting at pid, so the
// index here is (field number - 3).
const STAT_PPID: usize = 1;
const STAT_UTIME: usize = 11;
const STAT_STIME: usize = 12;
const STAT_STARTTIME: usize = 19;
const STAT_RSS: usize = 21;

/// Reads process records from a proc filesystem mounted at `root`.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    root: PathBuf,
    page_size: u64,
}

impl ProcfsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            page_size: *PAGE_SIZE,
        }
    }

    /// Overrides the page size, for proc trees captured on another host.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

impl RecordSource for ProcfsSource {
    fn list_pids(&self) -> TreeResult<Vec<u32>> {
        let entries = fs::read_dir(&self.root).map_err(|e| TreeError::Io {
            context: format!("failed to list {}", self.root.display()),
            source: e,
        })?;

        let mut out = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = match name.to_str() {
                Some(v) => v,
                None => continue,
            };
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            if let Ok(pid) = name.parse::<u32>() {
                out.push(pid);
            }
        }
        Ok(out)
    }

    fn read_record(&self, pid: u32) -> TreeResult<RawRecord> {
        let proc_path = self.root.join(pid.to_string());
        let content = fs::read_to_string(proc_path.join("stat"))
            .map_err(|e| TreeError::from_pid_io(pid, e))?;

        let mut record = parse_stat(pid, &content)?;

        // Kernel threads and foreign processes have no readable exe link.
        record.exe_path = match fs::read_link(proc_path.join("exe")) {
            Ok(p) => Some(p),
            Err(e) => {
                debug!("No exe link for pid {}: {}", pid, e);
                None
            }
        };

        Ok(record)
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }
}

/// Parses the contents of `/proc/<pid>/stat`.
pub fn parse_stat(pid: u32, content: &str) -> TreeResult<RawRecord> {
    let parse_err = |reason: &str| TreeError::Parse {
        pid,
        reason: reason.to_string(),
    };

    let open = content
        .find('(')
        .ok_or_else(|| parse_err("missing '(' before command name"))?;
    let close = content
        .rfind(')')
        .ok_or_else(|| parse_err("missing ')' after command name"))?;
    if close < open {
        return Err(parse_err("malformed command name"));
    }

    let comm = content[open + 1..close].to_string();
    let fields: Vec<&str> = content[close + 1..].split_whitespace().collect();
    if fields.len() <= STAT_RSS {
        return Err(parse_err("Invalid stat format"));
    }

    let field = |idx: usize, name: &str| -> TreeResult<u64> {
        fields[idx]
            .parse::<u64>()
            .map_err(|_| parse_err(&format!("Failed to parse {name} field")))
    };

    let ppid = fields[STAT_PPID]
        .parse::<u32>()
        .map_err(|_| parse_err("Failed to parse ppid field"))?;

    // rss is a signed long in the kernel; negative values do not occur for
    // live processes but are clamped rather than rejected.
    let rss_pages = fields[STAT_RSS]
        .parse::<i64>()
        .map_err(|_| parse_err("Failed to parse rss field"))?
        .max(0) as u64;

    Ok(RawRecord {
        pid,
        ppid,
        comm,
        rss_pages,
        utime_ticks: field(STAT_UTIME, "utime")?,
        stime_ticks: field(STAT_STIME, "stime")?,
        start_ticks: field(STAT_STARTTIME, "starttime")?,
        exe_path: None,
    })
}

/// Clock based on the aggregate `cpu` line of `/proc/stat`.
#[derive(Debug, Clone)]
pub struct ProcStatClock {
    stat_path: PathBuf,
}

impl ProcStatClock {
    pub fn new(proc_root: impl AsRef<Path>) -> Self {
        Self {
            stat_path: proc_root.as_ref().join("stat"),
        }
    }
}

impl Default for ProcStatClock {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

impl ClockSource for ProcStatClock {
    fn ticks_since_boot(&self) -> TreeResult<f64> {
        let content = fs::read_to_string(&self.stat_path).map_err(|e| TreeError::Io {
            context: format!("failed to read {}", self.stat_path.display()),
            source: e,
        })?;
        parse_ticks_since_boot(&content).ok_or_else(|| TreeError::Io {
            context: format!("failed to parse {}", self.stat_path.display()),
            source: std::io::Error::other("missing or malformed aggregate cpu line"),
        })
    }
}

/// Sums the aggregate `cpu` line of `/proc/stat` and averages it over the
/// per-core `cpuN` lines.
pub fn parse_ticks_since_boot(content: &str) -> Option<f64> {
    let mut total: Option<u64> = None;
    let mut cores = 0u32;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let label = match parts.next() {
            Some(l) => l,
            None => continue,
        };

        if label == "cpu" {
            let mut sum = 0u64;
            for val in parts {
                sum += val.parse::<u64>().ok()?;
            }
            total = Some(sum);
        } else if label.starts_with("cpu") && label[3..].chars().all(|c| c.is_ascii_digit()) {
            cores += 1;
        }
    }

    total.map(|t| t as f64 / cores.max(1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const STAT_LINE: &str = "1234 (test_process) S 1 1234 1234 0 -1 4194304 100 0 0 0 1000 500 0 0 20 0 1 0 12345 12345678 1234 18446744073709551615 4194304 4238788 140736466511168 0 0 0 0 0 0 0 0 0 17 1 0 0 0 0 0";

    fn write_proc(root: &Path, pid: u32, stat: &str) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).expect("Failed to create pid dir");
        fs::write(dir.join("stat"), stat).expect("Failed to write stat file");
    }

    // -------------------------------------------------------------------------
    // Tests for parse_stat
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_stat_fields() {
        let record = parse_stat(1234, STAT_LINE).expect("valid stat");
        assert_eq!(record.pid, 1234);
        assert_eq!(record.ppid, 1);
        assert_eq!(record.comm, "test_process");
        assert_eq!(record.utime_ticks, 1000);
        assert_eq!(record.stime_ticks, 500);
        assert_eq!(record.start_ticks, 12345);
        assert_eq!(record.rss_pages, 1234);
        assert!(record.exe_path.is_none());
    }

    #[test]
    fn test_parse_stat_comm_with_spaces_and_parens() {
        let line = STAT_LINE.replace("(test_process)", "(evil) S 99 (name)");
        let record = parse_stat(1234, &line).expect("valid stat");
        assert_eq!(record.comm, "evil) S 99 (name");
        assert_eq!(record.ppid, 1);
    }

    #[test]
    fn test_parse_stat_invalid() {
        assert!(matches!(
            parse_stat(1, "1234 (test) S 1 2 3"),
            Err(TreeError::Parse { pid: 1, .. })
        ));
        assert!(parse_stat(1, "garbage").is_err());
    }

    // -------------------------------------------------------------------------
    // Tests for parse_ticks_since_boot
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_ticks_since_boot_averages_cores() {
        let content = "cpu  100 0 100 600 100 50 50 0 0 0\n\
                       cpu0 50 0 50 300 50 25 25 0 0 0\n\
                       cpu1 50 0 50 300 50 25 25 0 0 0\n\
                       intr 12345\n";
        assert_eq!(parse_ticks_since_boot(content), Some(500.0));
    }

    #[test]
    fn test_parse_ticks_since_boot_missing_aggregate() {
        assert_eq!(parse_ticks_since_boot("intr 1\nctxt 2\n"), None);
    }

    // -------------------------------------------------------------------------
    // Tests for ProcfsSource
    // -------------------------------------------------------------------------

    #[test]
    fn test_list_pids_skips_non_numeric() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_proc(dir.path(), 1, STAT_LINE);
        write_proc(dir.path(), 42, STAT_LINE);
        fs::create_dir_all(dir.path().join("self")).unwrap();
        fs::write(dir.path().join("stat"), "cpu 1 2 3\n").unwrap();

        let source = ProcfsSource::new(dir.path());
        let mut pids = source.list_pids().expect("list pids");
        pids.sort_unstable();
        assert_eq!(pids, vec![1, 42]);
    }

    #[test]
    fn test_read_record_missing_pid_is_not_found() {
        let dir = tempdir().expect("Failed to create temp dir");
        let source = ProcfsSource::new(dir.path());
        assert!(matches!(source.read_record(77), Err(TreeError::NotFound(77))));
    }

    #[cfg(unix)]
    #[test]
    fn test_read_record_resolves_exe_link() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_proc(dir.path(), 1234, STAT_LINE);
        std::os::unix::fs::symlink("/usr/bin/true", dir.path().join("1234").join("exe"))
            .expect("Failed to create exe symlink");

        let source = ProcfsSource::new(dir.path()).with_page_size(4096);
        let record = source.read_record(1234).expect("record");
        assert_eq!(record.exe_path, Some(PathBuf::from("/usr/bin/true")));
        assert_eq!(source.page_size(), 4096);
    }

    #[test]
    fn test_proc_stat_clock_reads_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("stat"), "cpu 10 10 10 10\ncpu0 10 10 10 10\n").unwrap();
        let clock = ProcStatClock::new(dir.path());
        assert_eq!(clock.ticks_since_boot().unwrap(), 40.0);

        let missing = ProcStatClock::new(dir.path().join("nope"));
        assert!(missing.ticks_since_boot().is_err());
    }
}
