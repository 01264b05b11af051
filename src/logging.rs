use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Where log lines go.
pub enum LogTarget<'a> {
    Stderr,
    /// Appended to a file; used while the terminal UI owns the screen.
    File(&'a Path),
}

/// Init tracing. `RUST_LOG` takes precedence over `level`.
pub fn init(level: &str, json: bool, target: LogTarget<'_>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match target {
        LogTarget::Stderr => {
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr);
            if json {
                builder.json().init();
            } else {
                builder.init();
            }
        }
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            if json {
                builder.json().init();
            } else {
                builder.init();
            }
        }
    }

    Ok(())
}
