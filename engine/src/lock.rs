//! PID-file based single-instance lock.
//!
//! This is a liveness check against the local process table, not a
//! distributed lock: it is only correct for one user on one machine.

use crate::clock::SharedClock;
use crate::common::LockError;
use crate::process::{Pid, SharedProcessTable};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LOCK_ATTEMPTS: u32 = 3;
pub const DEFAULT_LOCK_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Result of a lock acquisition that did not fail
#[derive(Debug)]
pub enum LockOutcome {
    /// This process now owns the lock until the guard is dropped
    Acquired(LockGuard),
    /// A live process already owns the lock
    AlreadyRunning { pid: Pid },
}

pub struct InstanceLock {
    path: PathBuf,
    attempts: u32,
    retry_delay: Duration,
    processes: SharedProcessTable,
    clock: SharedClock,
}

impl InstanceLock {
    pub fn new(
        path: impl Into<PathBuf>,
        processes: SharedProcessTable,
        clock: SharedClock,
    ) -> Self {
        Self {
            path: path.into(),
            attempts: DEFAULT_LOCK_ATTEMPTS,
            retry_delay: DEFAULT_LOCK_RETRY_DELAY,
            processes,
            clock,
        }
    }

    pub fn with_retries(mut self, attempts: u32, retry_delay: Duration) -> Self {
        self.attempts = attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Create the lock file with this process's PID.
    ///
    /// A conflicting lock whose owner is alive yields
    /// [`LockOutcome::AlreadyRunning`]. A dead, empty or garbled record is
    /// removed and creation is retried, up to the configured attempt count.
    pub async fn acquire(&self) -> Result<LockOutcome, LockError> {
        let own_pid = std::process::id() as Pid;

        for attempt in 1..=self.attempts {
            match self.try_create(own_pid) {
                Ok(()) => {
                    log::info!("Acquired lock {} (pid {own_pid})", self.path.display());
                    return Ok(LockOutcome::Acquired(LockGuard::new(self.path.clone())));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(source) => {
                    return Err(LockError::Io {
                        path: self.path.clone(),
                        source,
                    });
                }
            }

            let owner = read_owner(&self.path);
            let owner_alive = match owner {
                Some(pid) if pid != own_pid => self.processes.is_alive(pid).await,
                _ => false,
            };

            match owner {
                Some(owner) if owner_alive => {
                    log::info!("Another instance is already running (pid {owner})");
                    return Ok(LockOutcome::AlreadyRunning { pid: owner });
                }
                Some(owner) => {
                    log::warn!("Removing stale lock left by pid {owner}");
                }
                None => {
                    log::warn!("Removing unreadable lock file {}", self.path.display());
                }
            }

            remove_lock_file(&self.path);

            if attempt < self.attempts {
                self.clock.sleep(self.retry_delay).await;
            }
        }

        Err(LockError::RetriesExhausted {
            path: self.path.clone(),
            attempts: self.attempts,
        })
    }

    fn try_create(&self, pid: Pid) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)?;

        if let Err(e) = file.write_all(pid.to_string().as_bytes()) {
            drop(file);
            remove_lock_file(&self.path);
            return Err(e);
        }
        Ok(())
    }
}

/// Owns the lock file; removes it on [`release`](LockGuard::release) or drop
/// while the record still names this process
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            released: false,
        }
    }

    /// Remove the lock file if it still holds our PID. Safe to call more
    /// than once; never fails.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let own_pid = std::process::id() as Pid;
        match read_owner(&self.path) {
            Some(pid) if pid == own_pid => {
                remove_lock_file(&self.path);
                log::debug!("Released lock {}", self.path.display());
            }
            Some(pid) => {
                log::warn!(
                    "Lock {} now belongs to pid {pid}, leaving it",
                    self.path.display()
                );
            }
            None if self.path.exists() => {
                log::warn!(
                    "Lock {} no longer holds our pid, leaving it",
                    self.path.display()
                );
            }
            None => {}
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.release();
    }
}

fn read_owner(path: &Path) -> Option<Pid> {
    let content = fs::read_to_string(path).ok()?;
    content.trim().parse::<Pid>().ok()
}

fn remove_lock_file(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove lock file {}: {e}", path.display()),
    }
}
