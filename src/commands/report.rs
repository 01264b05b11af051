//! `shadowreconx` (default mode): print every section and export the reports.

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;

use crate::config::Config;
use crate::domain::export;
use crate::domain::plugin::PluginRegistry;
use crate::domain::snapshot::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Sectioned text
    Table,
    /// The JSON report on stdout
    Json,
}

pub fn run(config: &Config, format: OutputFormat) -> Result<()> {
    let snapshot = PluginRegistry::builtin(config).run_all();

    match format {
        OutputFormat::Json => {
            println!("{}", export::to_pretty_json(&snapshot)?.trim_end());
        }
        OutputFormat::Table => print_sections(&snapshot),
    }

    export_reports(config, &snapshot)?;

    let done = "[+] Reports exported successfully.".green();
    match format {
        // keep stdout parseable
        OutputFormat::Json => eprintln!("{}", done),
        OutputFormat::Table => println!("{}", done),
    }
    Ok(())
}

/// Write both reports into the configured output directory.
pub fn export_reports(config: &Config, snapshot: &Snapshot) -> Result<()> {
    let json_path = config.json_report_path();
    export::export_json(snapshot, &json_path)
        .with_context(|| format!("writing {}", json_path.display()))?;

    let text_path = config.text_report_path();
    export::export_text(snapshot, &text_path)
        .with_context(|| format!("writing {}", text_path.display()))?;
    Ok(())
}

fn print_sections(snapshot: &Snapshot) {
    println!();
    println!("{}", "[ ShadowReconX | Modular Recon Tool ]".cyan().bold());
    println!();

    for (section, output) in &snapshot.plugins {
        println!("{}", format!("[{}]", section).yellow());
        for line in output.lines() {
            println!("{}", line);
        }
        println!();
    }

    println!(
        "{} {}",
        "Snapshot taken at:".dimmed(),
        snapshot.timestamp.to_rfc3339()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_export_reports_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            output_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let snapshot = Snapshot::new(Utc::now());

        export_reports(&config, &snapshot).unwrap();

        assert!(config.json_report_path().exists());
        let text = std::fs::read_to_string(config.text_report_path()).unwrap();
        assert!(text.starts_with("ShadowReconX Security Audit Report\n"));
        assert_eq!(export::read_json(&config.json_report_path()).unwrap(), snapshot);
    }
}
