//! Heuristic process risk score.
//!
//! Four independent additive checks, capped at 100. This is a name/status
//! heuristic for triage, not a detection engine.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::process_table::ProcessRow;
use crate::config::RiskConfig;

pub const SUSPICIOUS_NAMES: [&str; 7] = [
    "nc",
    "netcat",
    "meterpreter",
    "mimikatz",
    "powershell",
    "cmd",
    "bash",
];

const SUSPICIOUS_NAME_POINTS: u8 = 50;
const ZOMBIE_POINTS: u8 = 30;
const PRIVILEGED_OWNER_POINTS: u8 = 10;
const HIGH_CPU_POINTS: u8 = 10;
pub const MAX_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Mid,
    High,
}

impl RiskTier {
    pub fn from_score(score: u8) -> Self {
        if score >= 70 {
            RiskTier::High
        } else if score >= 40 {
            RiskTier::Mid
        } else {
            RiskTier::Low
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskTier::Low => write!(f, "low"),
            RiskTier::Mid => write!(f, "mid"),
            RiskTier::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRecord {
    pub pid: u32,
    pub name: String,
    pub user: Option<String>,
    pub status: String,
    pub score: u8,
    pub tier: RiskTier,
}

pub struct RiskScorer {
    suspicious: HashSet<String>,
    high_cpu_percent: f32,
}

impl Default for RiskScorer {
    fn default() -> Self {
        Self::new(&RiskConfig::default())
    }
}

impl RiskScorer {
    pub fn new(config: &RiskConfig) -> Self {
        let suspicious = SUSPICIOUS_NAMES
            .iter()
            .map(|s| s.to_string())
            .chain(config.extra_suspicious_names.iter().map(|s| normalize_name(s)))
            .collect();

        Self {
            suspicious,
            high_cpu_percent: config.high_cpu_percent,
        }
    }

    pub fn is_suspicious(&self, name: &str) -> bool {
        self.suspicious.contains(&normalize_name(name))
    }

    pub fn score(&self, row: &ProcessRow) -> u8 {
        let mut score: u8 = 0;
        if self.is_suspicious(&row.name) {
            score += SUSPICIOUS_NAME_POINTS;
        }
        if row.status == "zombie" {
            score += ZOMBIE_POINTS;
        }
        if matches!(row.user.as_deref(), Some("root") | Some("SYSTEM")) {
            score += PRIVILEGED_OWNER_POINTS;
        }
        if row.cpu_percent > self.high_cpu_percent {
            score += HIGH_CPU_POINTS;
        }
        score.min(MAX_SCORE)
    }

    pub fn assess(&self, row: &ProcessRow) -> RiskRecord {
        let score = self.score(row);
        RiskRecord {
            pid: row.pid,
            name: row.name.clone(),
            user: row.user.clone(),
            status: row.status.clone(),
            score,
            tier: RiskTier::from_score(score),
        }
    }

    pub fn assess_all(&self, rows: &[ProcessRow]) -> Vec<RiskRecord> {
        rows.iter().map(|r| self.assess(r)).collect()
    }
}

/// Lowercase, without a Windows `.exe` suffix.
fn normalize_name(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    match lower.strip_suffix(".exe") {
        Some(stem) => stem.to_string(),
        None => lower,
    }
}
