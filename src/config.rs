use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory receiving reports, the audit log and the view's log file.
    pub output_dir: PathBuf,
    pub json_report: String,
    pub text_report: String,
    pub audit_log: String,
    /// Blocking CPU sample window for the CPU plugin.
    pub cpu_sample_ms: u64,
    pub log_level: String,
    pub log_file: String,
    pub risk: RiskConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub high_cpu_percent: f32,
    pub extra_suspicious_names: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            json_report: "shadowreconx_report.json".into(),
            text_report: "shadowreconx_report.txt".into(),
            audit_log: "shadowreconx_audit.log".into(),
            cpu_sample_ms: 1000,
            log_level: "warn".into(),
            log_file: "shadowreconx.log".into(),
            risk: RiskConfig::default(),
        }
    }
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            high_cpu_percent: 50.0,
            extra_suspicious_names: Vec::new(),
        }
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("could not determine config directory")?;
        Ok(config_dir.join("shadowreconx").join("config.yaml"))
    }

    pub fn json_report_path(&self) -> PathBuf {
        self.output_dir.join(&self.json_report)
    }

    pub fn text_report_path(&self) -> PathBuf {
        self.output_dir.join(&self.text_report)
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.output_dir.join(&self.audit_log)
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.output_dir.join(&self.log_file)
    }
}

/// Load configuration: defaults, then the YAML file, then `SHADOWRECONX_*` env vars.
///
/// An explicit `path` must exist; the default location is optional.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let file = match path {
        Some(p) => {
            if !p.exists() {
                anyhow::bail!("config file {} does not exist", p.display());
            }
            Some(p.to_path_buf())
        }
        None => Config::path().ok().filter(|p| p.exists()),
    };

    let mut figment = Figment::from(Serialized::defaults(Config::default()));
    if let Some(file) = &file {
        figment = figment.merge(Yaml::file(file));
    }
    figment = figment.merge(Env::prefixed("SHADOWRECONX_").split("__"));

    figment.extract().with_context(|| match &file {
        Some(f) => format!("parsing {}", f.display()),
        None => "parsing configuration".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_report_names() {
        let cfg = Config::default();
        assert_eq!(cfg.json_report, "shadowreconx_report.json");
        assert_eq!(cfg.text_report, "shadowreconx_report.txt");
        assert_eq!(cfg.audit_log, "shadowreconx_audit.log");
        assert_eq!(cfg.cpu_sample_ms, 1000);
        assert_eq!(cfg.risk.high_cpu_percent, 50.0);
        assert_eq!(
            cfg.audit_log_path(),
            PathBuf::from(".").join("shadowreconx_audit.log")
        );
    }

    #[test]
    fn test_load_yaml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "output_dir: /tmp/recon\ncpu_sample_ms: 250\nrisk:\n  extra_suspicious_names: [ncat]\n",
        )
        .unwrap();

        let cfg = load(Some(&path)).unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("/tmp/recon"));
        assert_eq!(cfg.cpu_sample_ms, 250);
        assert_eq!(cfg.risk.extra_suspicious_names, vec!["ncat".to_string()]);
        // untouched keys keep their defaults
        assert_eq!(cfg.risk.high_cpu_percent, 50.0);
        assert_eq!(cfg.json_report, "shadowreconx_report.json");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(load(Some(&missing)).is_err());
    }
}
