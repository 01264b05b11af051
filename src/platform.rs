//! Platform identity: OS family, machine architecture, WSL and current user.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    MacOS,
    Windows,
    Other(&'static str),
}

impl Os {
    pub fn current() -> Self {
        Self::from_consts(std::env::consts::OS)
    }

    fn from_consts(os: &'static str) -> Self {
        match os {
            "linux" => Os::Linux,
            "macos" => Os::MacOS,
            "windows" => Os::Windows,
            other => Os::Other(other),
        }
    }
}

impl fmt::Display for Os {
    /// Uses the conventional `uname -s` style names.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Os::Linux => write!(f, "Linux"),
            Os::MacOS => write!(f, "Darwin"),
            Os::Windows => write!(f, "Windows"),
            Os::Other(name) => {
                let mut chars = name.chars();
                match chars.next() {
                    Some(first) => write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str()),
                    None => write!(f, "unknown"),
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct Platform {
    pub os: Os,
    pub arch: &'static str,
    pub is_wsl: bool,
}

pub fn detect() -> Platform {
    let os = Os::current();
    let is_wsl = matches!(os, Os::Linux) && detect_wsl();

    Platform {
        os,
        arch: std::env::consts::ARCH,
        is_wsl,
    }
}

fn detect_wsl() -> bool {
    std::fs::read_to_string("/proc/version")
        .map(|v| {
            let lower = v.to_lowercase();
            lower.contains("microsoft") || lower.contains("wsl")
        })
        .unwrap_or(false)
}

pub fn hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".into())
}

/// Login name of the user running this process.
///
/// Environment first (same order as most login tools), then the passwd entry
/// for the effective uid.
pub fn current_user() -> String {
    for var in ["LOGNAME", "USER", "LNAME", "USERNAME"] {
        if let Ok(name) = std::env::var(var) {
            if !name.is_empty() {
                return name;
            }
        }
    }
    passwd_name().unwrap_or_else(|| "unknown".into())
}

#[cfg(unix)]
fn passwd_name() -> Option<String> {
    let uid = unsafe { libc::geteuid() };
    let users = sysinfo::Users::new_with_refreshed_list();
    users
        .list()
        .iter()
        .find(|u| **u.id() == uid)
        .map(|u| u.name().to_string())
}

#[cfg(not(unix))]
fn passwd_name() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_os_display_names() {
        assert_eq!(Os::Linux.to_string(), "Linux");
        assert_eq!(Os::MacOS.to_string(), "Darwin");
        assert_eq!(Os::Windows.to_string(), "Windows");
        assert_eq!(Os::from_consts("freebsd").to_string(), "Freebsd");
    }

    #[test]
    fn test_detect_matches_build_target() {
        let platform = detect();
        assert_eq!(platform.arch, std::env::consts::ARCH);
        if !matches!(platform.os, Os::Linux) {
            assert!(!platform.is_wsl);
        }
    }

    #[test]
    fn test_current_user_is_not_empty() {
        assert!(!current_user().is_empty());
    }
}
