//! Error types for process tree construction and rendering.

use std::io;

/// Result alias used throughout the library.
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors raised while reading records, building the tree, or validating options.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Process exited between enumeration and lookup.
    #[error("process {0} not found")]
    NotFound(u32),

    #[error("permission denied reading process {0}")]
    PermissionDenied(u32),

    /// Ancestor chain loops back on itself.
    #[error("parent cycle detected while resolving pid {pid}: {chain:?}")]
    CycleDetected { pid: u32, chain: Vec<u32> },

    #[error("root pid {0} is not present in the process tree")]
    RootNotFound(u32),

    #[error("invalid value '{value}' for {option}, expected one of: {expected}")]
    InvalidOption {
        option: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("failed to parse record for pid {pid}: {reason}")]
    Parse { pid: u32, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl TreeError {
    /// Maps an I/O failure while reading a pid's data onto the matching error kind.
    pub fn from_pid_io(pid: u32, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => TreeError::NotFound(pid),
            io::ErrorKind::PermissionDenied => TreeError::PermissionDenied(pid),
            _ => TreeError::Io {
                context: format!("failed to read process {pid}"),
                source: err,
            },
        }
    }
}
