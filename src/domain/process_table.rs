//! Live process inventory backed by `sysinfo`.
//!
//! The underlying `System` is kept between refreshes so per-process CPU usage
//! is measured over the interval since the previous refresh. The first
//! refresh therefore reports 0% for every process.
//!
//! On Linux sysinfo also lists every thread (as a child of its process);
//! those entries are skipped so only real processes appear.

use sysinfo::{Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System, Users};

/// One process as seen by the last refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRow {
    pub pid: u32,
    pub parent: Option<u32>,
    pub name: String,
    pub user: Option<String>,
    pub status: String,
    pub cpu_percent: f32,
}

pub struct ProcessTable {
    system: System,
    users: Users,
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            users: Users::new_with_refreshed_list(),
        }
    }

    /// Re-read every process and return them ordered by pid.
    pub fn refresh(&mut self) -> Vec<ProcessRow> {
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::everything(),
        );
        self.users = Users::new_with_refreshed_list();

        let mut rows: Vec<ProcessRow> = self
            .system
            .processes()
            .values()
            .filter(|p| p.thread_kind().is_none())
            .map(|p| self.row(p))
            .collect();
        rows.sort_by_key(|r| r.pid);
        rows
    }

    /// Refresh a single pid. `None` when the process does not exist or the id
    /// names a thread.
    pub fn lookup(&mut self, pid: u32) -> Option<ProcessRow> {
        let target = Pid::from_u32(pid);
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[target]),
            true,
            ProcessRefreshKind::everything(),
        );
        self.system
            .process(target)
            .filter(|p| p.thread_kind().is_none())
            .map(|p| self.row(p))
    }

    fn row(&self, process: &Process) -> ProcessRow {
        let user = process
            .user_id()
            .and_then(|uid| self.users.get_user_by_id(uid))
            .map(|u| u.name().to_string());

        ProcessRow {
            pid: process.pid().as_u32(),
            parent: process.parent().map(|p| p.as_u32()),
            name: process.name().to_string_lossy().into_owned(),
            user,
            status: status_label(process.status()).to_string(),
            cpu_percent: process.cpu_usage(),
        }
    }
}

/// Lowercase status names, matching `ps`-style vocabulary.
pub fn status_label(status: ProcessStatus) -> &'static str {
    match status {
        ProcessStatus::Run => "running",
        ProcessStatus::Sleep => "sleeping",
        ProcessStatus::Idle => "idle",
        ProcessStatus::Stop => "stopped",
        ProcessStatus::Zombie => "zombie",
        ProcessStatus::Dead => "dead",
        ProcessStatus::UninterruptibleDiskSleep => "disk-sleep",
        _ => "unknown",
    }
}
