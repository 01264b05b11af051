//! Append-only audit trail of process actions.
//!
//! Each entry is one line: `<utc timestamp> | <ACTION> | PID=<pid> | <name>`.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Terminate,
    KillTree,
    Suspend,
    Resume,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Terminate => write!(f, "TERMINATE"),
            AuditAction::KillTree => write!(f, "KILL_TREE"),
            AuditAction::Suspend => write!(f, "SUSPEND"),
            AuditAction::Resume => write!(f, "RESUME"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one entry. The file is opened per entry in append mode.
    pub fn record(&self, action: AuditAction, pid: u32, name: &str) -> Result<()> {
        self.record_at(Utc::now(), action, pid, name)
    }

    fn record_at(&self, at: DateTime<Utc>, action: AuditAction, pid: u32, name: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format_entry(at, action, pid, name).as_bytes())?;

        info!(action = %action, pid, name, "audit entry recorded");
        Ok(())
    }
}

fn format_entry(at: DateTime<Utc>, action: AuditAction, pid: u32, name: &str) -> String {
    format!(
        "{} | {} | PID={} | {}\n",
        at.format("%Y-%m-%dT%H:%M:%S%.6f"),
        action,
        pid,
        escape_controls(name)
    )
}

/// Process names may carry control characters (`PR_SET_NAME`); keep each
/// entry on one line.
fn escape_controls(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_control() {
            out.extend(c.escape_default());
        } else {
            out.push(c);
        }
    }
    out
}
