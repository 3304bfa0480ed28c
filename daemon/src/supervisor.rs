//! Daemon lifecycle: lock, initial apply, watch, and shutdown.

use crate::config::AppConfig;
use anyhow::Context;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use walsync_engine::clock::{SharedClock, SystemClock};
use walsync_engine::lock::{InstanceLock, LockOutcome};
use walsync_engine::paths::ThemePaths;
use walsync_engine::pipeline::{ApplyOutcome, ApplyPipeline, PipelineTimings, PipelineWorker};
use walsync_engine::process::{Pid, ProcFs, SharedProcessTable};
use walsync_engine::resolver::ThemeResolver;
use walsync_engine::watcher::ChangeWatcher;

/// Why [`Supervisor::run`] returned. Every variant is a clean exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Another live instance holds the lock
    AlreadyRunning { pid: Pid },
    /// No editor process is left to reload
    ConsumerExited,
    /// SIGINT or SIGTERM
    Interrupted,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::AlreadyRunning { pid } => {
                write!(f, "another instance is already running (pid {pid})")
            }
            ShutdownReason::ConsumerExited => write!(f, "no running editor instances found"),
            ShutdownReason::Interrupted => write!(f, "interrupt received"),
        }
    }
}

pub struct Supervisor {
    paths: Arc<ThemePaths>,
    lock_path: PathBuf,
    lock_attempts: u32,
    lock_retry_delay: Duration,
    consumer_name: String,
    liveness_interval: Duration,
    debounce: Duration,
    timings: PipelineTimings,
    processes: SharedProcessTable,
    clock: SharedClock,
}

impl Supervisor {
    pub fn from_config(config: &AppConfig, home: &Path) -> Self {
        Self {
            paths: Arc::new(config.paths().theme_paths(home)),
            lock_path: config.paths().lock_file(home),
            lock_attempts: config.timings().lock_attempts(),
            lock_retry_delay: config.timings().lock_retry_delay(),
            consumer_name: config.consumer().process_name().to_string(),
            liveness_interval: config.consumer().liveness_interval(),
            debounce: config.timings().debounce(),
            timings: config.timings().pipeline_timings(),
            processes: ProcFs::shared(),
            clock: SystemClock::shared(),
        }
    }

    pub fn with_process_table(mut self, processes: SharedProcessTable) -> Self {
        self.processes = processes;
        self
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn paths(&self) -> &ThemePaths {
        &self.paths
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Run until the editor exits or `shutdown` is cancelled.
    ///
    /// Errors are startup failures; the lock is released on every path.
    pub async fn run(self, shutdown: CancellationToken) -> anyhow::Result<ShutdownReason> {
        let lock = InstanceLock::new(&self.lock_path, self.processes.clone(), self.clock.clone())
            .with_retries(self.lock_attempts, self.lock_retry_delay);

        let mut guard = match lock
            .acquire()
            .await
            .context("Could not acquire the instance lock")?
        {
            LockOutcome::Acquired(guard) => guard,
            LockOutcome::AlreadyRunning { pid } => {
                return Ok(ShutdownReason::AlreadyRunning { pid });
            }
        };

        let worker = self.build_worker();

        match worker
            .run_once()
            .await
            .context("Initial theme update failed")?
        {
            Some(ApplyOutcome::Published) => log::info!("Initial theme applied"),
            Some(ApplyOutcome::Skipped) | None => {}
            Some(ApplyOutcome::PartialFailure) => {
                log::warn!("Initial theme could not be published, waiting for changes")
            }
        }

        let watcher = ChangeWatcher::start(&self.paths, worker, self.clock.clone(), self.debounce)
            .context("Could not start the filesystem watcher")?;

        let reason = self.wait_for_shutdown(&shutdown).await;

        watcher.stop().await;
        guard.release();
        Ok(reason)
    }

    fn build_worker(&self) -> Arc<PipelineWorker> {
        let resolver = ThemeResolver::new(self.paths.clone());
        let pipeline = ApplyPipeline::new(&self.paths, self.clock.clone(), self.processes.clone())
            .with_timings(self.timings)
            .with_consumer_name(self.consumer_name.clone());
        PipelineWorker::shared(resolver, pipeline)
    }

    async fn wait_for_shutdown(&self, shutdown: &CancellationToken) -> ShutdownReason {
        log::info!(
            "Watching for theme changes, checking for {} every {:?}",
            self.consumer_name,
            self.liveness_interval
        );

        let mut liveness = tokio::time::interval_at(
            Instant::now() + self.liveness_interval,
            self.liveness_interval,
        );
        liveness.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => return ShutdownReason::Interrupted,
                _ = liveness.tick() => {
                    if !self.processes.any_named(&self.consumer_name).await {
                        return ShutdownReason::ConsumerExited;
                    }
                }
            }
        }
    }
}

/// Cancel `shutdown` on SIGINT or SIGTERM
pub async fn listen_for_signals(shutdown: CancellationToken) {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => Some(stream),
        Err(e) => {
            log::warn!("Could not listen for SIGTERM: {e}");
            None
        }
    };

    let sigterm = async {
        match terminate.as_mut() {
            Some(stream) => {
                stream.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                log::warn!("Could not listen for Ctrl-C: {e}");
                return;
            }
        }
        () = sigterm => {}
    }

    shutdown.cancel();
}
