//! `shadowreconx --gui`: collect once, then hand the snapshot to the terminal view.

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::domain::plugin::PluginRegistry;
use crate::gui::{self, app::App};

pub fn run(config: &Config) -> Result<()> {
    eprintln!("Collecting host state...");
    let snapshot = PluginRegistry::builtin(config).run_all();
    info!(sections = snapshot.plugins.len(), "snapshot ready, starting view");

    let app = App::new(config.clone(), snapshot);
    gui::run(app)
}
