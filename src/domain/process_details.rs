//! Per-process open files and inet connections.
//!
//! Linux reads each process's fd table and the tcp/udp socket tables through
//! `procfs`. Elsewhere both probes report access denied.

use std::fmt;
use std::net::SocketAddr;

use super::process_table::{ProcessRow, ProcessTable};

pub const ACCESS_DENIED: &str = "Access Denied";

/// Result of probing one aspect of a process.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe<T> {
    Listed(Vec<T>),
    Denied,
}

impl<T: fmt::Display> Probe<T> {
    /// Comma separated items, `None` when empty.
    pub fn summary(&self) -> String {
        match self {
            Probe::Denied => ACCESS_DENIED.to_string(),
            Probe::Listed(items) if items.is_empty() => "None".to_string(),
            Probe::Listed(items) => items
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection {
    pub local: SocketAddr,
    pub remote: Option<SocketAddr>,
}

impl Connection {
    /// An all-zero remote endpoint (listening or unconnected socket) is absent.
    pub fn new(local: SocketAddr, remote: SocketAddr) -> Self {
        let remote = if remote.ip().is_unspecified() && remote.port() == 0 {
            None
        } else {
            Some(remote)
        };
        Self { local, remote }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.remote {
            Some(remote) => write!(f, "{}->{}", fmt_addr(&self.local), fmt_addr(&remote)),
            None => write!(f, "{}->-", fmt_addr(&self.local)),
        }
    }
}

/// `ip:port` without IPv6 brackets.
fn fmt_addr(addr: &SocketAddr) -> String {
    format!("{}:{}", addr.ip(), addr.port())
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessDetails {
    pub pid: u32,
    pub name: String,
    pub user: Option<String>,
    pub status: String,
    pub open_files: Probe<String>,
    pub connections: Probe<Connection>,
}

/// Probe every process currently visible in `table`.
pub fn collect_all(table: &mut ProcessTable) -> Vec<ProcessDetails> {
    let rows = table.refresh();
    let sockets = imp::socket_table();
    rows.into_iter().map(|row| details_for(row, &sockets)).collect()
}

fn details_for(row: ProcessRow, sockets: &imp::SocketTable) -> ProcessDetails {
    let (open_files, connections) = imp::probe(row.pid, sockets);
    ProcessDetails {
        pid: row.pid,
        name: row.name,
        user: row.user,
        status: row.status,
        open_files,
        connections,
    }
}

#[cfg(target_os = "linux")]
mod imp {
    use std::collections::HashMap;

    use procfs::process::{FDTarget, Process};
    use procfs::ProcError;
    use tracing::debug;

    use super::{Connection, Probe};

    pub type SocketTable = HashMap<u64, Connection>;

    /// Inet sockets of every namespace-visible process, keyed by inode.
    pub fn socket_table() -> SocketTable {
        let mut table = SocketTable::new();

        let tcp = procfs::net::tcp()
            .into_iter()
            .chain(procfs::net::tcp6())
            .flatten()
            .map(|e| (e.inode, Connection::new(e.local_address, e.remote_address)));
        table.extend(tcp);

        let udp = procfs::net::udp()
            .into_iter()
            .chain(procfs::net::udp6())
            .flatten()
            .map(|e| (e.inode, Connection::new(e.local_address, e.remote_address)));
        table.extend(udp);

        debug!(sockets = table.len(), "socket table loaded");
        table
    }

    pub fn probe(pid: u32, sockets: &SocketTable) -> (Probe<String>, Probe<Connection>) {
        let process = match i32::try_from(pid)
            .map_err(|_| ProcError::NotFound(None))
            .and_then(Process::new)
        {
            Ok(process) => process,
            Err(e) => return unreadable(pid, e),
        };
        let fds = match process.fd() {
            Ok(fds) => fds,
            Err(e) => return unreadable(pid, e),
        };

        let mut files: Vec<String> = Vec::new();
        let mut conns: Vec<Connection> = Vec::new();
        for fd in fds.flatten() {
            match fd.target {
                FDTarget::Socket(inode) => {
                    if let Some(conn) = sockets.get(&inode) {
                        conns.push(*conn);
                    }
                }
                FDTarget::Path(path) if path.is_absolute() && path.is_file() => {
                    let path = path.to_string_lossy().into_owned();
                    if !files.contains(&path) {
                        files.push(path);
                    }
                }
                _ => {}
            }
        }
        (Probe::Listed(files), Probe::Listed(conns))
    }

    /// A process that exited meanwhile has nothing open; anything else is denied.
    fn unreadable(pid: u32, err: ProcError) -> (Probe<String>, Probe<Connection>) {
        match err {
            ProcError::NotFound(_) => (Probe::Listed(vec![]), Probe::Listed(vec![])),
            e => {
                debug!(pid, error = %e, "fd table unreadable");
                (Probe::Denied, Probe::Denied)
            }
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod imp {
    use super::{Connection, Probe};

    pub type SocketTable = ();

    pub fn socket_table() -> SocketTable {}

    pub fn probe(_pid: u32, _sockets: &SocketTable) -> (Probe<String>, Probe<Connection>) {
        (Probe::Denied, Probe::Denied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_listing_summaries() {
        assert_eq!(Probe::<String>::Denied.summary(), "Access Denied");
        assert_eq!(Probe::<String>::Listed(vec![]).summary(), "None");
        assert_eq!(
            Probe::Listed(vec!["/a".to_string(), "/b".to_string()]).summary(),
            "/a, /b"
        );
    }

    #[test]
    fn test_connection_display() {
        let local = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)), 5555);
        let remote = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)), 443);
        assert_eq!(
            Connection { local, remote: Some(remote) }.to_string(),
            "10.0.0.2:5555->1.1.1.1:443"
        );
        assert_eq!(Connection { local, remote: None }.to_string(), "10.0.0.2:5555->-");
    }

    #[test]
    fn test_connection_without_peer() {
        let local: SocketAddr = "127.0.0.1:53".parse().unwrap();
        let conn = Connection::new(local, "0.0.0.0:0".parse().unwrap());
        assert_eq!(conn.remote, None);
        assert_eq!(conn.to_string(), "127.0.0.1:53->-");

        let v6 = Connection::new("[::1]:8080".parse().unwrap(), "[::]:0".parse().unwrap());
        assert_eq!(v6.to_string(), "::1:8080->-");

        let peer = Connection::new(local, "10.0.0.9:0".parse().unwrap());
        assert_eq!(peer.remote, Some("10.0.0.9:0".parse().unwrap()));
    }

    #[cfg(target_os = "linux")]
    mod linux {
        use super::super::*;

        #[test]
        fn test_own_listener_is_reported() {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap();
            let sockets = imp::socket_table();

            let (_, conns) = imp::probe(std::process::id(), &sockets);
            match conns {
                Probe::Listed(conns) => assert!(conns
                    .iter()
                    .any(|c| c.local == addr && c.remote.is_none())),
                Probe::Denied => panic!("own fds must be readable"),
            }
        }

        #[test]
        fn test_vanished_pid_lists_nothing() {
            let sockets = imp::socket_table();
            let (files, conns) = imp::probe(u32::MAX - 1, &sockets);
            assert_eq!(files.summary(), "None");
            assert_eq!(conns.summary(), "None");
        }

        #[test]
        fn test_collect_all_sees_own_open_file() {
            let file = tempfile::NamedTempFile::new().unwrap();
            let path = file.path().to_string_lossy().into_owned();
            let mut table = ProcessTable::new();

            let details = collect_all(&mut table);
            let me = details
                .iter()
                .find(|d| d.pid == std::process::id())
                .expect("own process listed");
            match &me.open_files {
                Probe::Listed(files) => assert!(files.contains(&path)),
                Probe::Denied => panic!("own fds must be readable"),
            }
        }
    }
}
