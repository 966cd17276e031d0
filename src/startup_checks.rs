//! Startup requirement validation for herakles-proc-tree.
//!
//! Checks that the proc filesystem is readable and warns when running without
//! root, since executable links of other users' processes are then unreadable
//! and their names fall back to the raw command name.

use nix::unistd::geteuid;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Validate all runtime requirements
pub fn validate_requirements(proc_root: &Path) -> Result<(), ValidationError> {
    debug!("🔍 Validating runtime requirements...");

    check_user_privileges();
    check_proc_access(proc_root)?;

    debug!("✅ All runtime requirements validated");
    Ok(())
}

/// Check if running with sufficient privileges
fn check_user_privileges() {
    if !geteuid().is_root() {
        info!("ℹ️  Not running as root - names of foreign processes fall back to command names");
    } else {
        debug!("✅ Running as root (uid=0)");
    }
}

/// Check that the proc root exists and lists at least one process
fn check_proc_access(proc_root: &Path) -> Result<(), ValidationError> {
    let entries = match fs::read_dir(proc_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ValidationError::ProcMissing(proc_root.to_path_buf()));
        }
        Err(e) => return Err(ValidationError::ProcUnreadable(e.to_string())),
    };

    let has_pid = entries.flatten().any(|entry| {
        entry
            .file_name()
            .to_str()
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
    });

    if !has_pid {
        warn!(
            "⚠️  No process directories found under {} - is procfs mounted?",
            proc_root.display()
        );
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("proc filesystem not found at {0}")]
    ProcMissing(PathBuf),

    #[error("proc filesystem not readable: {0}")]
    ProcUnreadable(String),
}
