//! Process lifecycle actions: terminate, suspend, resume and kill-tree.
//!
//! Every successful action is written to the audit log. Failed actions are
//! never audited.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{info, warn};

use super::audit::{AuditAction, AuditLog};
use super::process_table::{ProcessRow, ProcessTable};
use crate::error::{ReconError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcSignal {
    Terminate,
    Stop,
    Continue,
}

impl ProcSignal {
    fn label(self) -> &'static str {
        match self {
            ProcSignal::Terminate => "terminate",
            ProcSignal::Stop => "suspend",
            ProcSignal::Continue => "resume",
        }
    }
}

/// Outcome of a kill-tree run. Members are listed in signalling order.
#[derive(Debug, Default, Clone)]
pub struct KillTreeReport {
    pub signalled: Vec<ProcessRow>,
    pub failed: Vec<(ProcessRow, String)>,
    /// Signalled members whose audit entry could not be written.
    pub unaudited: Vec<(ProcessRow, String)>,
}

impl KillTreeReport {
    /// Every member signalled and audited.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.unaudited.is_empty()
    }
}

pub struct ProcessManager {
    table: ProcessTable,
    audit: AuditLog,
}

impl ProcessManager {
    pub fn new(audit: AuditLog) -> Self {
        Self {
            table: ProcessTable::new(),
            audit,
        }
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Current view of a single process.
    pub fn describe(&mut self, pid: u32) -> Result<ProcessRow> {
        self.table.lookup(pid).ok_or(ReconError::NoSuchProcess(pid))
    }

    pub fn terminate(&mut self, pid: u32) -> Result<ProcessRow> {
        self.apply(pid, ProcSignal::Terminate, AuditAction::Terminate)
    }

    pub fn suspend(&mut self, pid: u32) -> Result<ProcessRow> {
        self.apply(pid, ProcSignal::Stop, AuditAction::Suspend)
    }

    pub fn resume(&mut self, pid: u32) -> Result<ProcessRow> {
        self.apply(pid, ProcSignal::Continue, AuditAction::Resume)
    }

    /// All descendants of `pid` followed by `pid` itself.
    pub fn tree_members(&mut self, pid: u32) -> Result<Vec<ProcessRow>> {
        let rows = self.table.refresh();
        let by_pid: HashMap<u32, &ProcessRow> = rows.iter().map(|r| (r.pid, r)).collect();
        if !by_pid.contains_key(&pid) {
            return Err(ReconError::NoSuchProcess(pid));
        }

        let mut members: Vec<ProcessRow> = descendants(pid, &rows)
            .into_iter()
            .filter_map(|p| by_pid.get(&p).map(|r| (*r).clone()))
            .collect();
        if let Some(root) = by_pid.get(&pid) {
            members.push((*root).clone());
        }
        Ok(members)
    }

    /// Terminate a whole process tree, descendants first. Members that cannot
    /// be signalled are skipped and reported. A failing audit write never
    /// stops the run; affected members are listed in `unaudited`.
    pub fn kill_tree(&mut self, pid: u32) -> Result<KillTreeReport> {
        let members = self.tree_members(pid)?;
        let mut report = KillTreeReport::default();

        for member in members {
            match send_signal(member.pid, ProcSignal::Terminate) {
                Ok(()) => {
                    if let Err(e) = self.audit.record(AuditAction::KillTree, member.pid, &member.name) {
                        warn!(pid = member.pid, error = %e, "audit entry not written");
                        report.unaudited.push((member.clone(), e.to_string()));
                    }
                    report.signalled.push(member);
                }
                Err(e) => {
                    warn!(pid = member.pid, name = %member.name, error = %e, "skipping tree member");
                    report.failed.push((member, e.to_string()));
                }
            }
        }

        info!(
            root = pid,
            signalled = report.signalled.len(),
            failed = report.failed.len(),
            unaudited = report.unaudited.len(),
            "kill tree finished"
        );
        Ok(report)
    }

    fn apply(&mut self, pid: u32, signal: ProcSignal, action: AuditAction) -> Result<ProcessRow> {
        let row = self.describe(pid)?;
        send_signal(pid, signal)?;
        self.audit.record(action, pid, &row.name)?;
        info!(pid, name = %row.name, action = signal.label(), "process action applied");
        Ok(row)
    }
}

/// Every transitive child of `root` (breadth-first), excluding `root`.
pub fn descendants(root: u32, rows: &[ProcessRow]) -> Vec<u32> {
    let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
    for row in rows {
        if let Some(parent) = row.parent {
            if parent != row.pid {
                children.entry(parent).or_default().push(row.pid);
            }
        }
    }

    let mut seen = HashSet::from([root]);
    let mut queue = VecDeque::from([root]);
    let mut out = Vec::new();
    while let Some(current) = queue.pop_front() {
        if let Some(kids) = children.get(&current) {
            for &kid in kids {
                if seen.insert(kid) {
                    out.push(kid);
                    queue.push_back(kid);
                }
            }
        }
    }
    out
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: ProcSignal) -> Result<()> {
    // pid 0 and negative pids address process groups
    let target = match libc::pid_t::try_from(pid) {
        Ok(p) if p > 0 => p,
        _ => return Err(ReconError::NoSuchProcess(pid)),
    };
    let signo = match signal {
        ProcSignal::Terminate => libc::SIGTERM,
        ProcSignal::Stop => libc::SIGSTOP,
        ProcSignal::Continue => libc::SIGCONT,
    };

    if unsafe { libc::kill(target, signo) } == 0 {
        return Ok(());
    }

    let err = std::io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ESRCH) => Err(ReconError::NoSuchProcess(pid)),
        Some(libc::EPERM) => Err(ReconError::AccessDenied(pid)),
        _ => Err(ReconError::Signal {
            pid,
            reason: err.to_string(),
        }),
    }
}

#[cfg(not(unix))]
fn send_signal(pid: u32, signal: ProcSignal) -> Result<()> {
    use sysinfo::{Pid, ProcessesToUpdate, Signal, System};

    let target = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[target]), true);
    let process = system
        .process(target)
        .ok_or(ReconError::NoSuchProcess(pid))?;

    let delivered = match signal {
        ProcSignal::Terminate => Some(process.kill()),
        ProcSignal::Stop => process.kill_with(Signal::Stop),
        ProcSignal::Continue => process.kill_with(Signal::Continue),
    };
    match delivered {
        Some(true) => Ok(()),
        Some(false) => Err(ReconError::AccessDenied(pid)),
        None => Err(ReconError::Unsupported {
            action: signal.label(),
        }),
    }
}
