//! Built-in collectors: one [`Plugin`] per section of the report.
//!
//! All probing goes through `sysinfo`; failures on a single item (an
//! unreadable partition, a process that exits mid-scan) drop that item only.

use std::net::IpAddr;
use std::time::Duration;

use sysinfo::{Disks, Networks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::debug;

use super::plugin::Plugin;
use super::process_table::ProcessTable;
use super::snapshot::*;
use crate::error::Result;
use crate::platform;

// ═══════════════════════════════════════════════════════════
// SYSTEM
// ═══════════════════════════════════════════════════════════

pub struct SystemPlugin;

impl Plugin for SystemPlugin {
    fn name(&self) -> &str {
        "System Info"
    }

    fn collect(&self) -> Result<PluginOutput> {
        let host = platform::detect();
        let info = SystemInfo {
            os: host.os.to_string(),
            release: System::kernel_version().unwrap_or_else(|| "unknown".into()),
            version: System::long_os_version()
                .or_else(System::os_version)
                .unwrap_or_else(|| "unknown".into()),
            architecture: host.arch.to_string(),
            hostname: platform::hostname(),
            user: platform::current_user(),
            uptime_seconds: System::uptime(),
            is_wsl: host.is_wsl,
        };
        PluginOutput::record(&info)
    }
}

// ═══════════════════════════════════════════════════════════
// CPU
// ═══════════════════════════════════════════════════════════

pub struct CpuPlugin {
    sample: Duration,
}

impl CpuPlugin {
    pub fn new(sample_ms: u64) -> Self {
        Self {
            sample: Duration::from_millis(sample_ms).max(MINIMUM_CPU_UPDATE_INTERVAL),
        }
    }
}

impl Plugin for CpuPlugin {
    fn name(&self) -> &str {
        "CPU Info"
    }

    /// Blocks for the sample window.
    fn collect(&self) -> Result<PluginOutput> {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        std::thread::sleep(self.sample);
        sys.refresh_cpu_usage();

        let cores_logical = match sys.cpus().len() {
            0 => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(0),
            n => n,
        };

        let info = CpuInfo {
            cores_physical: sys.physical_core_count(),
            cores_logical,
            usage_percent: finite_or_zero(round1(sys.global_cpu_usage() as f64)),
        };
        debug!(sample_ms = self.sample.as_millis() as u64, usage = info.usage_percent, "cpu sampled");
        PluginOutput::record(&info)
    }
}

// ═══════════════════════════════════════════════════════════
// MEMORY
// ═══════════════════════════════════════════════════════════

pub struct MemoryPlugin;

impl Plugin for MemoryPlugin {
    fn name(&self) -> &str {
        "Memory Info"
    }

    fn collect(&self) -> Result<PluginOutput> {
        let mut sys = System::new();
        sys.refresh_memory();
        PluginOutput::record(&memory_info(
            sys.total_memory(),
            sys.used_memory(),
            sys.available_memory(),
        ))
    }
}

fn memory_info(total: u64, used: u64, available: u64) -> MemoryInfo {
    let percent = if total > 0 {
        round1(used as f64 / total as f64 * 100.0)
    } else {
        0.0
    };
    MemoryInfo {
        total,
        used,
        available,
        percent,
    }
}

// ═══════════════════════════════════════════════════════════
// DISKS
// ═══════════════════════════════════════════════════════════

pub struct DiskPlugin;

impl Plugin for DiskPlugin {
    fn name(&self) -> &str {
        "Disk Info"
    }

    fn collect(&self) -> Result<PluginOutput> {
        let disks = Disks::new_with_refreshed_list();
        let entries: Vec<DiskEntry> = disks
            .list()
            .iter()
            .filter_map(|d| {
                disk_entry(
                    &d.name().to_string_lossy(),
                    &d.mount_point().to_string_lossy(),
                    &d.file_system().to_string_lossy(),
                    d.total_space(),
                    d.available_space(),
                )
            })
            .collect();
        PluginOutput::list(&entries)
    }
}

/// `None` for partitions without readable usage (zero-sized).
fn disk_entry(device: &str, mount: &str, fs: &str, total: u64, available: u64) -> Option<DiskEntry> {
    if total == 0 {
        debug!(mount, "skipping partition without usage data");
        return None;
    }
    Some(DiskEntry {
        device: device.to_string(),
        mount: mount.to_string(),
        fs: fs.to_string(),
        total,
        used: total.saturating_sub(available),
    })
}

// ═══════════════════════════════════════════════════════════
// NETWORK
// ═══════════════════════════════════════════════════════════

pub struct NetworkPlugin;

impl Plugin for NetworkPlugin {
    fn name(&self) -> &str {
        "Network Info"
    }

    fn collect(&self) -> Result<PluginOutput> {
        let networks = Networks::new_with_refreshed_list();
        let mut names: Vec<&String> = networks.list().keys().collect();
        names.sort();

        let mut entries = Vec::new();
        for name in names {
            let Some(data) = networks.list().get(name) else {
                continue;
            };
            let ips: Vec<(IpAddr, u8)> = data
                .ip_networks()
                .iter()
                .map(|n| (n.addr, n.prefix))
                .collect();
            let mac = data.mac_address();
            let mac = (!mac.is_unspecified()).then(|| mac.to_string());
            entries.extend(interface_addresses(name, &ips, mac));
        }
        PluginOutput::list(&entries)
    }
}

const LINK_FAMILY: &str = if cfg!(target_os = "linux") {
    "AF_PACKET"
} else {
    "AF_LINK"
};

fn interface_addresses(name: &str, ips: &[(IpAddr, u8)], mac: Option<String>) -> Vec<InterfaceAddress> {
    let mut out: Vec<InterfaceAddress> = ips
        .iter()
        .map(|(addr, prefix)| InterfaceAddress {
            interface: name.to_string(),
            address: addr.to_string(),
            family: match addr {
                IpAddr::V4(_) => "AF_INET".to_string(),
                IpAddr::V6(_) => "AF_INET6".to_string(),
            },
            prefix: Some(*prefix),
        })
        .collect();

    if let Some(mac) = mac {
        out.push(InterfaceAddress {
            interface: name.to_string(),
            address: mac,
            family: LINK_FAMILY.to_string(),
            prefix: None,
        });
    }
    out
}

// ═══════════════════════════════════════════════════════════
// PROCESSES
// ═══════════════════════════════════════════════════════════

pub struct ProcessPlugin;

impl Plugin for ProcessPlugin {
    fn name(&self) -> &str {
        "Processes"
    }

    fn collect(&self) -> Result<PluginOutput> {
        let entries: Vec<ProcessEntry> = ProcessTable::new()
            .refresh()
            .into_iter()
            .map(|row| ProcessEntry {
                pid: row.pid,
                name: row.name,
                username: row.user,
                status: row.status,
            })
            .collect();
        PluginOutput::list(&entries)
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}
