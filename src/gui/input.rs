//! Keyboard handling for the terminal view.

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::app::{App, AppResult, Focus, Modal, View};

/// Poll for one key press and apply it.
pub fn handle_input(app: &mut App) -> Result<AppResult> {
    if event::poll(Duration::from_millis(100))? {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                return Ok(AppResult::Continue);
            }
            return Ok(handle_key(app, key));
        }
    }

    Ok(AppResult::Continue)
}

pub fn handle_key(app: &mut App, key: KeyEvent) -> AppResult {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return AppResult::Quit;
    }

    match &app.modal {
        Some(Modal::PidPrompt { .. }) => handle_pid_prompt(app, key.code),
        Some(Modal::Confirm { .. }) => handle_confirm(app, key.code),
        Some(Modal::Message { .. }) | Some(Modal::FullValue { .. }) => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
                app.dismiss_modal();
            }
        }
        None => return handle_normal(app, key.code),
    }

    AppResult::Continue
}

fn handle_pid_prompt(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Char(c) => app.push_pid_char(c),
        KeyCode::Backspace => app.pop_pid_char(),
        KeyCode::Enter => app.submit_pid(),
        KeyCode::Esc => app.dismiss_modal(),
        _ => {}
    }
}

fn handle_confirm(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm(true),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.confirm(false),
        _ => {}
    }
}

fn handle_normal(app: &mut App, key: KeyCode) -> AppResult {
    match key {
        KeyCode::Char('q') | KeyCode::Esc => {
            if app.focus == Focus::Sidebar {
                return AppResult::Quit;
            }
            app.focus = Focus::Sidebar;
        }

        KeyCode::Tab => app.toggle_focus(),
        KeyCode::Up => app.move_up(),
        KeyCode::Down => app.move_down(),

        KeyCode::Enter => match (app.focus, &app.view) {
            (Focus::Sidebar, _) => app.activate_sidebar(),
            (Focus::Content, View::Details) => app.open_full_value(),
            _ => {}
        },

        KeyCode::Char(c) if app.focus == Focus::Content => match (&app.view, c) {
            (View::Processes, 'r') => {
                app.clear_status();
                app.refresh_processes();
            }
            (View::Details, 'r') => {
                app.clear_status();
                app.refresh_details();
            }
            (View::Processes | View::Details, 't') => app.request_terminate(),
            (View::Processes | View::Details, 'k') => app.request_kill_tree(),
            (View::Processes | View::Details, 's') => app.suspend_selected(),
            (View::Processes | View::Details, 'u') => app.resume_selected(),
            _ => {}
        },

        _ => {}
    }

    AppResult::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::snapshot::{PluginOutput, Snapshot};

    fn app_in(dir: &tempfile::TempDir) -> App {
        let config = Config {
            output_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let mut snapshot = Snapshot::new(chrono::Utc::now());
        snapshot
            .plugins
            .insert("System Info".into(), PluginOutput::default());
        App::new(config, snapshot)
    }

    fn press(app: &mut App, code: KeyCode) -> AppResult {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_ctrl_c_quits_even_inside_modal() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.modal = Some(Modal::PidPrompt {
            input: String::new(),
        });
        let result = handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert_eq!(result, AppResult::Quit);
    }

    #[test]
    fn test_q_quits_from_sidebar() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        assert_eq!(press(&mut app, KeyCode::Char('q')), AppResult::Quit);
    }

    #[test]
    fn test_open_section_then_back_to_sidebar() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);

        // Close View, Terminate Process (PID), System Info
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.view, View::Section("System Info".into()));

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Content);
        assert_eq!(press(&mut app, KeyCode::Esc), AppResult::Continue);
        assert_eq!(app.focus, Focus::Sidebar);
    }

    #[test]
    fn test_pid_prompt_typing_and_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Backspace);
        assert_eq!(
            app.modal,
            Some(Modal::PidPrompt { input: "1".into() })
        );

        // 'q' is text while the prompt is open
        assert_eq!(press(&mut app, KeyCode::Char('q')), AppResult::Continue);
        press(&mut app, KeyCode::Esc);
        assert!(app.modal.is_none());
    }

    #[test]
    fn test_message_is_dismissed_with_enter() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.modal = Some(Modal::Message {
            title: "Error".into(),
            body: "No such process.".into(),
            is_error: true,
        });
        press(&mut app, KeyCode::Char('x'));
        assert!(app.modal.is_some());
        press(&mut app, KeyCode::Enter);
        assert!(app.modal.is_none());
    }

    #[test]
    fn test_process_keys_ignored_outside_content() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        press(&mut app, KeyCode::Char('t'));
        press(&mut app, KeyCode::Char('k'));
        assert!(app.modal.is_none());
    }
}
