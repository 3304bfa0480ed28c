//! Filesystem change watcher for the pywal cache files.
//!
//! The parent directories are watched rather than the files, so writers that
//! delete and re-create a file are still seen. Events are forwarded from the
//! notify thread into a channel, filtered down to the two tracked cache files,
//! debounced, and handed to a [`ChangeHandler`] on a [`TaskPool`].

use crate::clock::SharedClock;
use crate::common::WatchError;
use crate::paths::ThemePaths;
use crate::pipeline::{ApplyOutcome, PipelineWorker};
use crate::taskpool::TaskPool;
use async_trait::async_trait;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Room for an apply to overlap the next trigger, which the worker then drops
const HANDLER_CONCURRENCY: usize = 2;

/// Receives accepted change events
#[async_trait]
pub trait ChangeHandler: Send + Sync + 'static {
    async fn on_change(&self, path: PathBuf);
}

#[async_trait]
impl ChangeHandler for PipelineWorker {
    async fn on_change(&self, path: PathBuf) {
        log::info!("Detected change in {}", path.display());
        match self.run_once().await {
            Ok(Some(ApplyOutcome::Published)) => log::info!("Theme update completed successfully"),
            Ok(Some(ApplyOutcome::Skipped)) | Ok(None) => {}
            Ok(Some(ApplyOutcome::PartialFailure)) => {
                log::warn!("Theme update did not reach the editor")
            }
            Err(e) => log::error!("Cannot resolve theme variant: {e}"),
        }
    }
}

/// Drops events closer than `window` to the last accepted one
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    pub fn accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}

/// Filters raw notify events and dispatches the survivors
pub struct ChangeDispatcher<H: ChangeHandler> {
    tracked: Vec<PathBuf>,
    debouncer: Debouncer,
    handler: Arc<H>,
    clock: SharedClock,
    pool: TaskPool,
}

impl<H: ChangeHandler> ChangeDispatcher<H> {
    pub fn new(
        tracked: Vec<PathBuf>,
        handler: Arc<H>,
        clock: SharedClock,
        debounce: Duration,
    ) -> Self {
        Self {
            tracked,
            debouncer: Debouncer::new(debounce),
            handler,
            clock,
            pool: TaskPool::new(HANDLER_CONCURRENCY),
        }
    }

    /// Tracked cache file touched by `event`, if the event is a content change
    pub fn relevant_path(&self, event: &Event) -> Option<PathBuf> {
        let is_change = match event.kind {
            EventKind::Modify(ModifyKind::Metadata(_)) => false,
            EventKind::Modify(_) | EventKind::Create(_) => true,
            _ => false,
        };
        if !is_change {
            return None;
        }

        event
            .paths
            .iter()
            .find(|p| self.tracked.iter().any(|t| t == *p) && !p.is_dir())
            .cloned()
    }

    /// Returns the path handed to the handler, or `None` if the event was
    /// filtered out or debounced.
    pub fn dispatch(&mut self, event: &Event) -> Option<PathBuf> {
        let path = self.relevant_path(event)?;
        if !self.debouncer.accept(self.clock.now()) {
            log::debug!("Debounced event for {}", path.display());
            return None;
        }

        let handler = self.handler.clone();
        let task_path = path.clone();
        self.pool.execute(async move {
            handler.on_change(task_path).await;
        });
        Some(path)
    }

    /// Consume events until the channel closes or `cancel` fires
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<notify::Result<Event>>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                received = events.recv() => match received {
                    Some(Ok(event)) => {
                        self.dispatch(&event);
                    }
                    Some(Err(e)) => log::warn!("Filesystem watch error: {e}"),
                    None => break,
                },
            }
        }
        // An apply that is already publishing runs to completion
        self.pool.wait_idle().await;
        self.pool.close();
        log::debug!("Change dispatcher stopped");
    }
}

/// Running watcher. Dropping it without [`stop`](ChangeWatcher::stop) also
/// unsubscribes, but does not wait for the dispatcher task.
pub struct ChangeWatcher {
    _watcher: RecommendedWatcher,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    watched: Vec<PathBuf>,
}

impl ChangeWatcher {
    pub fn start<H: ChangeHandler>(
        paths: &ThemePaths,
        handler: Arc<H>,
        clock: SharedClock,
        debounce: Duration,
    ) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means we are shutting down
            let _ = tx.send(res);
        })?;

        let mut watched: Vec<PathBuf> = Vec::new();
        for dir in watch_directories(paths) {
            if !dir.is_dir() {
                log::warn!("Cache directory {} does not exist, not watching it", dir.display());
                continue;
            }
            watcher
                .watch(&dir, RecursiveMode::NonRecursive)
                .map_err(|source| WatchError::Subscribe {
                    path: dir.clone(),
                    source,
                })?;
            log::info!("Monitoring {}", dir.display());
            watched.push(dir);
        }

        let tracked = paths.tracked_files().iter().map(|p| p.to_path_buf()).collect();
        let dispatcher = ChangeDispatcher::new(tracked, handler, clock, debounce);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(dispatcher.run(rx, cancel.clone()));

        Ok(Self {
            _watcher: watcher,
            cancel,
            task,
            watched,
        })
    }

    pub fn watched(&self) -> &[PathBuf] {
        &self.watched
    }

    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            log::warn!("Change dispatcher ended abnormally: {e}");
        }
        log::info!("Stopped watching cache directories");
    }
}

/// Unique parent directories of the tracked cache files
fn watch_directories(paths: &ThemePaths) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    for file in paths.tracked_files() {
        if let Some(parent) = file.parent().map(Path::to_path_buf) {
            if !dirs.contains(&parent) {
                dirs.push(parent);
            }
        }
    }
    dirs
}
