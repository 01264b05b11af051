//! Plugin registry and the execution engine that produces a [`Snapshot`].

use chrono::Utc;
use tracing::{debug, warn};

use super::collectors;
use super::snapshot::{PluginOutput, Snapshot};
use crate::config::Config;
use crate::error::Result;

/// A named host-state collector.
pub trait Plugin {
    fn name(&self) -> &str;
    fn collect(&self) -> Result<PluginOutput>;
}

#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The six built-in collectors, in report order.
    pub fn builtin(config: &Config) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(collectors::SystemPlugin));
        registry.register(Box::new(collectors::CpuPlugin::new(config.cpu_sample_ms)));
        registry.register(Box::new(collectors::MemoryPlugin));
        registry.register(Box::new(collectors::DiskPlugin));
        registry.register(Box::new(collectors::NetworkPlugin));
        registry.register(Box::new(collectors::ProcessPlugin));
        registry
    }

    /// Register a plugin. A second plugin with the same name replaces the
    /// first one in place.
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        match self.plugins.iter().position(|p| p.name() == plugin.name()) {
            Some(idx) => {
                debug!(plugin = plugin.name(), "replacing registered plugin");
                self.plugins[idx] = plugin;
            }
            None => self.plugins.push(plugin),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Run every plugin once, in registration order.
    pub fn run_all(&self) -> Snapshot {
        let mut snapshot = Snapshot::new(Utc::now());
        debug!(plugins = ?self.names(), "running collectors");
        for plugin in &self.plugins {
            let output = plugin.collect().unwrap_or_else(|e| {
                warn!(plugin = plugin.name(), error = %e, "plugin failed, section left empty");
                PluginOutput::default()
            });
            snapshot.plugins.insert(plugin.name().to_string(), output);
        }
        snapshot
    }
}
