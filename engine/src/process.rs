//! Access to the local process table.
//!
//! The lock uses it for PID liveness, the pipeline to signal the editor, and
//! the supervisor to notice when the editor is gone. Everything sits behind
//! [`ProcessTable`] so tests never signal real processes.

use crate::common::ProcessError;
use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid as NixPid;
use std::path::PathBuf;
use std::sync::Arc;

pub type Pid = i32;

/// Shared handle to a process table implementation
pub type SharedProcessTable = Arc<dyn ProcessTable>;

/// Linux truncates `/proc/<pid>/comm` to 15 bytes
const COMM_MAX_LEN: usize = 15;

#[async_trait]
pub trait ProcessTable: Send + Sync {
    /// Whether a process with this PID exists on the local machine
    async fn is_alive(&self, pid: Pid) -> bool;

    /// PIDs of every process whose executable name is exactly `name`
    async fn find_by_name(&self, name: &str) -> Result<Vec<Pid>, ProcessError>;

    /// Deliver the reload signal to `pid`
    async fn send_reload(&self, pid: Pid) -> Result<(), ProcessError>;

    /// Whether at least one process named `name` is running
    async fn any_named(&self, name: &str) -> bool {
        match self.find_by_name(name).await {
            Ok(pids) => !pids.is_empty(),
            Err(e) => {
                log::warn!("Could not check for running {name} processes: {e}");
                false
            }
        }
    }
}

/// Process table read from procfs, signals sent with `kill(2)`
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
    reload_signal: Signal,
}

impl ProcFs {
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/proc"),
            reload_signal: Signal::SIGUSR1,
        }
    }

    pub fn shared() -> SharedProcessTable {
        Arc::new(Self::new())
    }

    fn comm_matches(comm: &str, name: &str) -> bool {
        let wanted = if name.len() > COMM_MAX_LEN {
            name.get(..COMM_MAX_LEN).unwrap_or(name)
        } else {
            name
        };
        comm.trim_end() == wanted
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessTable for ProcFs {
    async fn is_alive(&self, pid: Pid) -> bool {
        // kill(0) and negative PIDs address process groups
        if pid <= 0 {
            return false;
        }
        match kill(NixPid::from_raw(pid), None) {
            Ok(()) => true,
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    async fn find_by_name(&self, name: &str) -> Result<Vec<Pid>, ProcessError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(ProcessError::Enumerate)?;

        let mut pids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(ProcessError::Enumerate)? {
            let Some(pid) = entry
                .file_name()
                .to_str()
                .and_then(|n| n.parse::<Pid>().ok())
            else {
                continue;
            };

            // Processes can exit between listing and reading comm
            if let Ok(comm) = tokio::fs::read_to_string(entry.path().join("comm")).await {
                if Self::comm_matches(&comm, name) {
                    pids.push(pid);
                }
            }
        }

        pids.sort_unstable();
        Ok(pids)
    }

    async fn send_reload(&self, pid: Pid) -> Result<(), ProcessError> {
        if pid <= 0 {
            return Err(ProcessError::Signal {
                pid,
                source: Errno::ESRCH,
            });
        }
        kill(NixPid::from_raw(pid), self.reload_signal)
            .map_err(|source| ProcessError::Signal { pid, source })
    }
}
