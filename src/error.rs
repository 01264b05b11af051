//! Error types for host collection, export and process actions.

use thiserror::Error;

/// Errors raised by the domain layer.
#[derive(Error, Debug)]
pub enum ReconError {
    /// The target process does not exist (or exited meanwhile)
    #[error("no such process (pid {0})")]
    NoSuchProcess(u32),

    /// The OS refused the operation
    #[error("access denied for pid {0}")]
    AccessDenied(u32),

    /// The requested signal is not available on this platform
    #[error("{action} is not supported on this platform")]
    Unsupported { action: &'static str },

    /// Any other failure while signalling a process
    #[error("failed to signal pid {pid}: {reason}")]
    Signal { pid: u32, reason: String },

    /// A collector plugin failed
    #[error("plugin '{name}' failed: {reason}")]
    Plugin { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReconError {
    /// Message shown to the operator in the interactive view.
    pub fn user_message(&self) -> String {
        match self {
            ReconError::NoSuchProcess(_) => "No such process.".to_string(),
            ReconError::AccessDenied(_) => {
                "Access denied. Try running with higher privileges.".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReconError>;
