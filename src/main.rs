mod commands;
mod config;
mod domain;
mod error;
mod gui;
mod logging;
mod platform;

use std::path::PathBuf;

use clap::Parser;

use commands::report::OutputFormat;
use logging::LogTarget;

#[derive(Parser)]
#[command(
    name = "shadowreconx",
    version,
    about = "Modular local host recon and process audit tool"
)]
struct Cli {
    /// Open the interactive terminal view instead of printing the report
    #[arg(long)]
    gui: bool,

    /// Path to config file (default: ~/.config/shadowreconx/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for reports and the audit log (overrides config)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Output format of the text mode
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Log filter, e.g. "info" or "shadowreconx=debug" (overrides config)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg = config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.output_dir {
        cfg.output_dir = dir;
    }
    if let Some(level) = cli.log_level {
        cfg.log_level = level;
    }

    if cli.gui {
        let log_path = cfg.log_file_path();
        logging::init(&cfg.log_level, cli.json_logs, LogTarget::File(&log_path))?;
        commands::gui::run(&cfg)
    } else {
        logging::init(&cfg.log_level, cli.json_logs, LogTarget::Stderr)?;
        commands::report::run(&cfg, cli.format)
    }
}
