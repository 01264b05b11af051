//! Report export: JSON and plain-text renditions of a [`Snapshot`].
//!
//! Files are written to a `.tmp` sibling first and then renamed into place so
//! a report on disk is always complete.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::snapshot::Snapshot;
use crate::error::Result;

const TEXT_TITLE: &str = "ShadowReconX Security Audit Report";

/// Write the snapshot as 4-space indented JSON.
pub fn export_json(snapshot: &Snapshot, path: &Path) -> Result<()> {
    let content = to_pretty_json(snapshot)?;
    write_atomic(path, content.as_bytes())?;
    info!(path = %path.display(), "json report written");
    Ok(())
}

/// Write the plain-text report.
pub fn export_text(snapshot: &Snapshot, path: &Path) -> Result<()> {
    write_atomic(path, render_text(snapshot).as_bytes())?;
    info!(path = %path.display(), "text report written");
    Ok(())
}

/// Parse a report previously written by [`export_json`].
pub fn read_json(path: &Path) -> Result<Snapshot> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn to_pretty_json(snapshot: &Snapshot) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    snapshot.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn render_text(snapshot: &Snapshot) -> String {
    let mut out = String::new();
    out.push_str(TEXT_TITLE);
    out.push('\n');
    out.push_str(&"=".repeat(40));
    out.push('\n');

    for (section, output) in &snapshot.plugins {
        out.push_str(&format!("\n[{}]\n", section));
        for line in output.lines() {
            out.push_str(&line);
            out.push('\n');
        }
    }
    out
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
