//! Interactive terminal view over a collected snapshot.

pub mod app;
pub mod input;
pub mod ui;

use std::io;

use anyhow::{anyhow, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use app::{App, AppResult};

/// Take over the terminal until the user quits.
pub fn run(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal
            .draw(|f| ui::draw(f, app))
            .map_err(|e| anyhow!("drawing frame: {}", e))?;

        match input::handle_input(app)? {
            AppResult::Continue => {}
            AppResult::Quit => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::snapshot::Snapshot;
    use ratatui::backend::TestBackend;

    #[test]
    fn test_frame_renders_for_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let app = App::new(config, Snapshot::new(chrono::Utc::now()));

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        assert!(terminal.draw(|f| ui::draw(f, &app)).is_ok());
    }
}
