//! Application state for the terminal view.
//!
//! Holds the startup snapshot, the live process tables and any open modal.
//! Nothing here touches the terminal, so every action is testable directly.

use tracing::warn;

use crate::config::Config;
use crate::domain::audit::AuditLog;
use crate::domain::export;
use crate::domain::process_control::{KillTreeReport, ProcessManager};
use crate::domain::process_details::{self, ProcessDetails};
use crate::domain::process_table::ProcessTable;
use crate::domain::risk::{RiskRecord, RiskScorer};
use crate::domain::snapshot::Snapshot;
use crate::error::ReconError;

pub const PROCESSES_SECTION: &str = "Processes";
pub const CLOSED_PLACEHOLDER: &str = "[ View closed – select another module from the sidebar ]";

/// Result of handling one input event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppResult {
    Continue,
    Quit,
}

/// Entries of the left-hand navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarItem {
    CloseView,
    TerminateByPid,
    Section(String),
    ProcessDetails,
    ExportJson,
    ExportReport,
}

impl SidebarItem {
    pub fn label(&self) -> &str {
        match self {
            SidebarItem::CloseView => "Close View",
            SidebarItem::TerminateByPid => "Terminate Process (PID)",
            SidebarItem::Section(name) => name,
            SidebarItem::ProcessDetails => "Process Details",
            SidebarItem::ExportJson => "Export JSON",
            SidebarItem::ExportReport => "Export Report",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Content,
}

/// What the content pane shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Closed,
    Section(String),
    Processes,
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    /// `announce` pops a success message instead of only updating the status bar
    Terminate { pid: u32, announce: bool },
    KillTree { pid: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    PidPrompt { input: String },
    Confirm { prompt: String, action: PendingAction },
    Message { title: String, body: String, is_error: bool },
    FullValue { title: String, body: String },
}

pub struct App {
    pub config: Config,
    pub snapshot: Snapshot,
    pub sidebar: Vec<SidebarItem>,
    pub sidebar_index: usize,
    pub focus: Focus,
    pub view: View,
    pub modal: Option<Modal>,
    pub processes: Vec<RiskRecord>,
    pub process_index: usize,
    pub details: Vec<ProcessDetails>,
    pub details_index: usize,
    pub section_scroll: u16,
    pub status_message: Option<String>,
    pub status_is_error: bool,
    table: ProcessTable,
    details_table: ProcessTable,
    manager: ProcessManager,
    scorer: RiskScorer,
}

impl App {
    pub fn new(config: Config, snapshot: Snapshot) -> Self {
        let mut sidebar = vec![SidebarItem::CloseView, SidebarItem::TerminateByPid];
        sidebar.extend(
            snapshot
                .section_names()
                .map(|name| SidebarItem::Section(name.to_string())),
        );
        sidebar.extend([
            SidebarItem::ProcessDetails,
            SidebarItem::ExportJson,
            SidebarItem::ExportReport,
        ]);

        let manager = ProcessManager::new(AuditLog::new(config.audit_log_path()));
        let scorer = RiskScorer::new(&config.risk);

        Self {
            config,
            snapshot,
            sidebar,
            sidebar_index: 0,
            focus: Focus::Sidebar,
            view: View::Closed,
            modal: None,
            processes: Vec::new(),
            process_index: 0,
            details: Vec::new(),
            details_index: 0,
            section_scroll: 0,
            status_message: None,
            status_is_error: false,
            table: ProcessTable::new(),
            details_table: ProcessTable::new(),
            manager,
            scorer,
        }
    }

    pub fn set_status(&mut self, message: &str, is_error: bool) {
        self.status_message = Some(message.to_string());
        self.status_is_error = is_error;
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
        self.status_is_error = false;
    }

    fn show_message(&mut self, title: &str, body: &str, is_error: bool) {
        self.modal = Some(Modal::Message {
            title: title.to_string(),
            body: body.to_string(),
            is_error,
        });
    }

    fn show_error(&mut self, err: &ReconError) {
        warn!(error = %err, "action failed");
        self.show_message("Error", &err.user_message(), true);
    }

    pub fn dismiss_modal(&mut self) {
        self.modal = None;
    }

    // ── Navigation ─────────────────────────────────────────

    pub fn toggle_focus(&mut self) {
        self.focus = match (self.focus, &self.view) {
            (Focus::Sidebar, View::Closed) => Focus::Sidebar,
            (Focus::Sidebar, _) => Focus::Content,
            (Focus::Content, _) => Focus::Sidebar,
        };
    }

    pub fn move_up(&mut self) {
        match self.focus {
            Focus::Sidebar => self.sidebar_index = self.sidebar_index.saturating_sub(1),
            Focus::Content => match self.view {
                View::Processes => self.process_index = self.process_index.saturating_sub(1),
                View::Details => self.details_index = self.details_index.saturating_sub(1),
                View::Section(_) => self.section_scroll = self.section_scroll.saturating_sub(1),
                View::Closed => {}
            },
        }
    }

    pub fn move_down(&mut self) {
        match self.focus {
            Focus::Sidebar => {
                if self.sidebar_index + 1 < self.sidebar.len() {
                    self.sidebar_index += 1;
                }
            }
            Focus::Content => match self.view {
                View::Processes => {
                    if self.process_index + 1 < self.processes.len() {
                        self.process_index += 1;
                    }
                }
                View::Details => {
                    if self.details_index + 1 < self.details.len() {
                        self.details_index += 1;
                    }
                }
                View::Section(_) => self.section_scroll = self.section_scroll.saturating_add(1),
                View::Closed => {}
            },
        }
    }

    /// Activate the highlighted sidebar entry.
    pub fn activate_sidebar(&mut self) {
        let Some(item) = self.sidebar.get(self.sidebar_index).cloned() else {
            return;
        };
        self.clear_status();

        match item {
            SidebarItem::CloseView => self.close_view(),
            SidebarItem::TerminateByPid => {
                self.modal = Some(Modal::PidPrompt {
                    input: String::new(),
                })
            }
            SidebarItem::Section(name) if name == PROCESSES_SECTION => self.open_processes(),
            SidebarItem::Section(name) => {
                self.view = View::Section(name);
                self.section_scroll = 0;
            }
            SidebarItem::ProcessDetails => self.open_details(),
            SidebarItem::ExportJson => self.export_json(),
            SidebarItem::ExportReport => self.export_text(),
        }
    }

    pub fn close_view(&mut self) {
        self.view = View::Closed;
        self.focus = Focus::Sidebar;
    }

    // ── Processes view ─────────────────────────────────────

    pub fn open_processes(&mut self) {
        self.view = View::Processes;
        self.focus = Focus::Content;
        self.refresh_processes();
    }

    pub fn refresh_processes(&mut self) {
        let rows = self.table.refresh();
        self.processes = self.scorer.assess_all(&rows);
        if self.process_index >= self.processes.len() {
            self.process_index = self.processes.len().saturating_sub(1);
        }
    }

    pub fn selected_pid(&self) -> Option<u32> {
        match self.view {
            View::Processes => self.processes.get(self.process_index).map(|r| r.pid),
            View::Details => self.details.get(self.details_index).map(|d| d.pid),
            _ => None,
        }
    }

    pub fn request_terminate(&mut self) {
        let Some(pid) = self.selected_pid() else {
            return;
        };
        self.confirm_terminate(pid, false);
    }

    fn confirm_terminate(&mut self, pid: u32, announce: bool) {
        match self.manager.describe(pid) {
            Ok(row) => {
                let prompt = if announce {
                    format!("Terminate process {} (PID {})?", row.name, pid)
                } else {
                    format!("Terminate {} (PID {})?", row.name, pid)
                };
                self.modal = Some(Modal::Confirm {
                    prompt,
                    action: PendingAction::Terminate { pid, announce },
                });
            }
            Err(e) => self.show_error(&e),
        }
    }

    pub fn request_kill_tree(&mut self) {
        let Some(pid) = self.selected_pid() else {
            return;
        };
        match self.manager.tree_members(pid) {
            Ok(members) => {
                let name = members
                    .last()
                    .map(|r| r.name.clone())
                    .unwrap_or_default();
                self.modal = Some(Modal::Confirm {
                    prompt: format!(
                        "Kill process tree of {} (PID {})? {} process(es) affected.",
                        name,
                        pid,
                        members.len()
                    ),
                    action: PendingAction::KillTree { pid },
                });
            }
            Err(e) => self.show_error(&e),
        }
    }

    pub fn suspend_selected(&mut self) {
        let Some(pid) = self.selected_pid() else {
            return;
        };
        match self.manager.suspend(pid) {
            Ok(row) => {
                self.set_status(&format!("Suspended {} (PID {})", row.name, pid), false);
                self.refresh_current();
            }
            Err(e) => self.show_error(&e),
        }
    }

    pub fn resume_selected(&mut self) {
        let Some(pid) = self.selected_pid() else {
            return;
        };
        match self.manager.resume(pid) {
            Ok(row) => {
                self.set_status(&format!("Resumed {} (PID {})", row.name, pid), false);
                self.refresh_current();
            }
            Err(e) => self.show_error(&e),
        }
    }

    /// Answer the open confirmation dialog.
    pub fn confirm(&mut self, accepted: bool) {
        let Some(Modal::Confirm { action, .. }) = self.modal.take() else {
            return;
        };
        if !accepted {
            return;
        }

        match action {
            PendingAction::Terminate { pid, announce } => match self.manager.terminate(pid) {
                Ok(row) => {
                    let msg = format!("Process {} (PID {}) terminated.", row.name, pid);
                    if announce {
                        self.show_message("Success", &msg, false);
                    } else {
                        self.set_status(&msg, false);
                    }
                    self.refresh_current();
                }
                Err(e) => self.show_error(&e),
            },
            PendingAction::KillTree { pid } => match self.manager.kill_tree(pid) {
                Ok(report) => {
                    self.set_status(&kill_tree_summary(pid, &report), !report.is_clean());
                    self.refresh_current();
                }
                Err(e) => self.show_error(&e),
            },
        }
    }

    fn refresh_current(&mut self) {
        match self.view {
            View::Processes => self.refresh_processes(),
            View::Details => self.refresh_details(),
            _ => {}
        }
    }

    // ── Terminate by PID ───────────────────────────────────

    pub fn push_pid_char(&mut self, c: char) {
        if let Some(Modal::PidPrompt { input }) = &mut self.modal {
            if c.is_ascii_digit() && input.len() < 10 {
                input.push(c);
            }
        }
    }

    pub fn pop_pid_char(&mut self) {
        if let Some(Modal::PidPrompt { input }) = &mut self.modal {
            input.pop();
        }
    }

    pub fn submit_pid(&mut self) {
        let Some(Modal::PidPrompt { input }) = self.modal.take() else {
            return;
        };
        if input.is_empty() {
            return;
        }
        match input.parse::<u32>() {
            Ok(pid) if pid > 0 => self.confirm_terminate(pid, true),
            _ => self.show_message("Error", "Please enter a valid PID.", true),
        }
    }

    // ── Process details view ───────────────────────────────

    pub fn open_details(&mut self) {
        self.view = View::Details;
        self.focus = Focus::Content;
        self.refresh_details();
    }

    pub fn refresh_details(&mut self) {
        self.details = process_details::collect_all(&mut self.details_table);
        if self.details_index >= self.details.len() {
            self.details_index = self.details.len().saturating_sub(1);
        }
    }

    /// Pop up the untruncated file and connection lists of the selected row.
    pub fn open_full_value(&mut self) {
        let Some(d) = self.details.get(self.details_index) else {
            return;
        };
        let body = format!(
            "{} (PID {})\n\nOpen files:\n{}\n\nConnections:\n{}",
            d.name,
            d.pid,
            d.open_files.summary().replace(", ", "\n"),
            d.connections.summary().replace(", ", "\n"),
        );
        self.modal = Some(Modal::FullValue {
            title: "Full Details".to_string(),
            body,
        });
    }

    // ── Export ─────────────────────────────────────────────

    pub fn export_json(&mut self) {
        let path = self.config.json_report_path();
        match export::export_json(&self.snapshot, &path) {
            Ok(()) => self.set_status(&format!("JSON report written to {}", path.display()), false),
            Err(e) => self.show_error(&e),
        }
    }

    pub fn export_text(&mut self) {
        let path = self.config.text_report_path();
        match export::export_text(&self.snapshot, &path) {
            Ok(()) => self.set_status(&format!("Text report written to {}", path.display()), false),
            Err(e) => self.show_error(&e),
        }
    }
}

fn kill_tree_summary(pid: u32, report: &KillTreeReport) -> String {
    let mut msg = format!(
        "Terminated {} process(es) in tree of PID {}",
        report.signalled.len(),
        pid
    );
    if !report.failed.is_empty() {
        msg.push_str(&format!(", {} skipped", report.failed.len()));
    }
    if !report.unaudited.is_empty() {
        msg.push_str(&format!(
            ", audit log not written for {}",
            report.unaudited.len()
        ));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::{MemoryInfo, PluginOutput};
    use chrono::Utc;

    fn snapshot() -> Snapshot {
        let mut snapshot = Snapshot::new(Utc::now());
        snapshot.plugins.insert(
            "Memory Info".into(),
            PluginOutput::record(&MemoryInfo {
                total: 4,
                used: 1,
                available: 3,
                percent: 25.0,
            })
            .unwrap(),
        );
        snapshot
            .plugins
            .insert(PROCESSES_SECTION.into(), PluginOutput::List(vec![]));
        snapshot
    }

    fn app_in(dir: &tempfile::TempDir) -> App {
        let config = Config {
            output_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        App::new(config, snapshot())
    }

    fn select(app: &mut App, label: &str) {
        app.focus = Focus::Sidebar;
        app.sidebar_index = app
            .sidebar
            .iter()
            .position(|i| i.label() == label)
            .unwrap();
        app.activate_sidebar();
    }

    #[test]
    fn test_sidebar_layout() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_in(&dir);
        let labels: Vec<&str> = app.sidebar.iter().map(|i| i.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Close View",
                "Terminate Process (PID)",
                "Memory Info",
                "Processes",
                "Process Details",
                "Export JSON",
                "Export Report"
            ]
        );
        assert_eq!(app.view, View::Closed);
    }

    #[test]
    fn test_section_then_close() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);

        select(&mut app, "Memory Info");
        assert_eq!(app.view, View::Section("Memory Info".into()));

        select(&mut app, "Close View");
        assert_eq!(app.view, View::Closed);
        assert_eq!(app.focus, Focus::Sidebar);
    }

    #[test]
    fn test_sidebar_navigation_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.move_up();
        assert_eq!(app.sidebar_index, 0);
        for _ in 0..50 {
            app.move_down();
        }
        assert_eq!(app.sidebar_index, app.sidebar.len() - 1);
    }

    #[test]
    fn test_processes_view_lists_scored_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);

        select(&mut app, PROCESSES_SECTION);
        assert_eq!(app.view, View::Processes);
        assert_eq!(app.focus, Focus::Content);
        let me = std::process::id();
        assert!(app.processes.iter().any(|r| r.pid == me));
        assert!(app.processes.iter().all(|r| r.score <= 100));
        assert!(app.selected_pid().is_some());
    }

    #[test]
    fn test_pid_prompt_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);

        select(&mut app, "Terminate Process (PID)");
        assert!(matches!(app.modal, Some(Modal::PidPrompt { .. })));
        app.push_pid_char('x');
        app.push_pid_char('4');
        app.pop_pid_char();
        app.push_pid_char('0');
        assert_eq!(
            app.modal,
            Some(Modal::PidPrompt {
                input: "0".into()
            })
        );
        app.submit_pid();
        // pid 0 is never a valid target
        assert!(matches!(
            app.modal,
            Some(Modal::Message { is_error: true, .. })
        ));
    }

    #[test]
    fn test_unknown_pid_reports_no_such_process() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);

        app.modal = Some(Modal::PidPrompt {
            input: (u32::MAX - 1).to_string(),
        });
        app.submit_pid();
        match &app.modal {
            Some(Modal::Message { body, is_error, .. }) => {
                assert!(is_error);
                assert_eq!(body, "No such process.");
            }
            other => panic!("unexpected modal {:?}", other),
        }
    }

    #[test]
    fn test_declined_confirmation_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.modal = Some(Modal::Confirm {
            prompt: "Terminate?".into(),
            action: PendingAction::Terminate {
                pid: std::process::id(),
                announce: false,
            },
        });
        app.confirm(false);
        assert!(app.modal.is_none());
        assert!(!app.config.audit_log_path().exists());
    }

    #[test]
    fn test_exports_write_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);

        select(&mut app, "Export JSON");
        assert!(app.config.json_report_path().exists());
        assert!(!app.status_is_error);

        select(&mut app, "Export Report");
        assert!(app.config.text_report_path().exists());
    }

    #[test]
    fn test_kill_tree_summary_mentions_audit_failures() {
        let row = |pid: u32| crate::domain::process_table::ProcessRow {
            pid,
            parent: None,
            name: "sleep".into(),
            user: None,
            status: "sleeping".into(),
            cpu_percent: 0.0,
        };
        let mut report = KillTreeReport {
            signalled: vec![row(11), row(10)],
            ..KillTreeReport::default()
        };
        assert_eq!(
            kill_tree_summary(10, &report),
            "Terminated 2 process(es) in tree of PID 10"
        );

        report.failed.push((row(12), "access denied".into()));
        report.unaudited.push((row(10), "Is a directory".into()));
        assert_eq!(
            kill_tree_summary(10, &report),
            "Terminated 2 process(es) in tree of PID 10, 1 skipped, audit log not written for 1"
        );
        assert!(!report.is_clean());
    }

    #[test]
    fn test_details_popup() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);

        select(&mut app, "Process Details");
        assert_eq!(app.view, View::Details);
        assert!(!app.details.is_empty());

        app.open_full_value();
        match &app.modal {
            Some(Modal::FullValue { body, .. }) => {
                assert!(body.contains("Open files:"));
                assert!(body.contains("Connections:"));
            }
            other => panic!("unexpected modal {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_terminate_by_pid_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        let mut child = std::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let pid = child.id();

        app.modal = Some(Modal::PidPrompt {
            input: pid.to_string(),
        });
        app.submit_pid();
        match &app.modal {
            Some(Modal::Confirm { prompt, .. }) => {
                assert_eq!(prompt, &format!("Terminate process sleep (PID {})?", pid))
            }
            other => panic!("unexpected modal {:?}", other),
        }

        app.confirm(true);
        match &app.modal {
            Some(Modal::Message { body, is_error, .. }) => {
                assert!(!is_error);
                assert_eq!(body, &format!("Process sleep (PID {}) terminated.", pid));
            }
            other => panic!("unexpected modal {:?}", other),
        }
        child.wait().unwrap();

        let log = std::fs::read_to_string(app.config.audit_log_path()).unwrap();
        assert!(log.contains(&format!("| TERMINATE | PID={} | sleep", pid)));
    }
}
