//! Snapshot: host state collected once at startup.
//!
//! Every plugin contributes one section. Collectors fill in typed records,
//! which are flattened into ordered generic records when stored so the
//! snapshot can be exported and rendered without knowing each plugin's type.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;

pub const TOOL_NAME: &str = "ShadowReconX";

/// One flat record: field name to primitive value, in collection order.
pub type Record = Map<String, Value>;

/// Complete result of one plugin run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tool: String,
    pub timestamp: DateTime<Utc>,
    pub plugins: IndexMap<String, PluginOutput>,
}

impl Snapshot {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            timestamp,
            plugins: IndexMap::new(),
        }
    }

    pub fn section(&self, name: &str) -> Option<&PluginOutput> {
        self.plugins.get(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }
}

/// A plugin returns either a single record or a list of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginOutput {
    Record(Record),
    List(Vec<Record>),
}

impl Default for PluginOutput {
    fn default() -> Self {
        PluginOutput::Record(Record::new())
    }
}

impl PluginOutput {
    pub fn record<T: Serialize>(value: &T) -> Result<Self> {
        Ok(PluginOutput::Record(to_record(value)?))
    }

    pub fn list<T: Serialize>(values: &[T]) -> Result<Self> {
        let records = values.iter().map(to_record).collect::<Result<Vec<_>>>()?;
        Ok(PluginOutput::List(records))
    }

    /// Lines as they appear in the text report and CLI output.
    pub fn lines(&self) -> Vec<String> {
        match self {
            PluginOutput::Record(record) => record
                .iter()
                .map(|(k, v)| format!("{}: {}", k, display_value(v)))
                .collect(),
            PluginOutput::List(records) => records.iter().map(inline_record).collect(),
        }
    }
}

fn to_record<T: Serialize>(value: &T) -> Result<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => {
            let mut map = Record::new();
            map.insert("value".into(), other);
            Ok(map)
        }
    }
}

/// Render a primitive without JSON quoting; `null` becomes `None`.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `{key: value, key: value}` on one line.
pub fn inline_record(record: &Record) -> String {
    let fields: Vec<String> = record
        .iter()
        .map(|(k, v)| format!("{}: {}", k, display_value(v)))
        .collect();
    format!("{{{}}}", fields.join(", "))
}

// ── Typed records ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub release: String,
    pub version: String,
    pub architecture: String,
    pub hostname: String,
    pub user: String,
    pub uptime_seconds: u64,
    pub is_wsl: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuInfo {
    pub cores_physical: Option<usize>,
    pub cores_logical: usize,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskEntry {
    pub device: String,
    pub mount: String,
    pub fs: String,
    pub total: u64,
    pub used: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceAddress {
    pub interface: String,
    pub address: String,
    pub family: String,
    pub prefix: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    pub username: Option<String>,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        let mut snapshot = Snapshot::new(Utc::now());
        snapshot.plugins.insert(
            "Memory Info".into(),
            PluginOutput::record(&MemoryInfo {
                total: 100,
                used: 40,
                available: 60,
                percent: 40.0,
            })
            .unwrap(),
        );
        snapshot.plugins.insert(
            "Disk Info".into(),
            PluginOutput::list(&[DiskEntry {
                device: "/dev/sda1".into(),
                mount: "/".into(),
                fs: "ext4".into(),
                total: 1000,
                used: 250,
            }])
            .unwrap(),
        );
        snapshot
    }

    #[test]
    fn test_record_keeps_field_order() {
        let snapshot = sample();
        let lines = snapshot.section("Memory Info").unwrap().lines();
        assert_eq!(
            lines,
            vec!["total: 100", "used: 40", "available: 60", "percent: 40.0"]
        );
    }

    #[test]
    fn test_list_lines_are_inline() {
        let snapshot = sample();
        let lines = snapshot.section("Disk Info").unwrap().lines();
        assert_eq!(
            lines,
            vec!["{device: /dev/sda1, mount: /, fs: ext4, total: 1000, used: 250}"]
        );
    }

    #[test]
    fn test_json_round_trip() {
        let snapshot = sample();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(
            back.section_names().collect::<Vec<_>>(),
            vec!["Memory Info", "Disk Info"]
        );
    }

    #[test]
    fn test_null_renders_as_none() {
        let cpu = PluginOutput::record(&CpuInfo {
            cores_physical: None,
            cores_logical: 8,
            usage_percent: 3.5,
        })
        .unwrap();
        assert_eq!(cpu.lines()[0], "cores_physical: None");
    }
}
