//! Apply pipeline: turns a resolved variant into a published editor theme.

use crate::clock::SharedClock;
use crate::common::ResolveError;
use crate::digest::{ContentHash, file_digest};
use crate::fsops::{CopyStatus, copy_file, publish_file};
use crate::palette::ThemeVariant;
use crate::paths::{ThemePaths, VariantPaths};
use crate::process::SharedProcessTable;
use crate::resolver::ThemeResolver;
use crate::stability::{DEFAULT_POLL_INTERVAL, DEFAULT_STABILITY_TIMEOUT, StabilityWaiter};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(300);
pub const DEFAULT_CONSUMER_NAME: &str = "nvim";

/// Waits used by one apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineTimings {
    pub stability_timeout: Duration,
    pub poll_interval: Duration,
    /// Extra delay before the second stability check
    pub settle_delay: Duration,
}

impl Default for PipelineTimings {
    fn default() -> Self {
        Self {
            stability_timeout: DEFAULT_STABILITY_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The theme was copied to the editor's path and the editor signaled
    Published,
    /// The cache source matches what was last published
    Skipped,
    /// The final copy failed, the editor still has the previous theme
    PartialFailure,
}

/// Hashes remembered between applies, for the lifetime of the process
#[derive(Debug, Default, Clone)]
pub struct ApplyRecord {
    last_published: Option<ContentHash>,
    last_source: Option<ContentHash>,
}

impl ApplyRecord {
    /// Digest of the destination right after the last successful publish
    pub fn last_published(&self) -> Option<ContentHash> {
        self.last_published
    }

    /// Digest of the cache source seen by the most recent apply
    pub fn last_source(&self) -> Option<ContentHash> {
        self.last_source
    }
}

pub struct ApplyPipeline {
    cache_destination: PathBuf,
    fallback_theme: PathBuf,
    consumer_name: String,
    timings: PipelineTimings,
    waiter: StabilityWaiter,
    clock: SharedClock,
    processes: SharedProcessTable,
    record: Mutex<ApplyRecord>,
}

impl ApplyPipeline {
    pub fn new(paths: &ThemePaths, clock: SharedClock, processes: SharedProcessTable) -> Self {
        Self {
            cache_destination: paths.cache_destination.clone(),
            fallback_theme: paths.fallback_theme.clone(),
            consumer_name: DEFAULT_CONSUMER_NAME.to_string(),
            timings: PipelineTimings::default(),
            waiter: StabilityWaiter::new(clock.clone()),
            clock,
            processes,
            record: Mutex::new(ApplyRecord::default()),
        }
    }

    pub fn with_timings(mut self, timings: PipelineTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_consumer_name(mut self, name: impl Into<String>) -> Self {
        self.consumer_name = name.into();
        self
    }

    pub async fn record(&self) -> ApplyRecord {
        self.record.lock().await.clone()
    }

    /// Run every step for `variant`.
    ///
    /// Steps log their own failures and let the next step run; only a failed
    /// publish is reported, as [`ApplyOutcome::PartialFailure`].
    pub async fn apply(&self, variant: ThemeVariant, paths: &VariantPaths) -> ApplyOutcome {
        let mut record = self.record.lock().await;
        let source = paths.cache_source.as_path();

        match copy_file(&self.fallback_theme, source, true).await {
            Ok(CopyStatus::Copied) => {
                log::info!("Bootstrapped {variant} cache from fallback theme")
            }
            Ok(CopyStatus::AlreadyPresent) => {}
            Err(e) => log::warn!("Could not bootstrap {variant} cache: {e}"),
        }

        if let Err(e) = copy_file(&paths.template_source, &paths.template_destination, false).await
        {
            log::warn!("Failed to copy template for {variant} mode: {e}");
        }

        self.wait_stable(source).await;

        let current = file_digest(source).await;
        record.last_source = current;
        if let Some(hash) = current {
            if record.last_published == Some(hash) {
                log::info!("No changes detected ({}), skipping update", hash.short());
                return ApplyOutcome::Skipped;
            }
        }

        // The generator may still be writing after the event that woke us
        self.clock.sleep(self.timings.settle_delay).await;
        self.wait_stable(source).await;

        if let Err(e) = publish_file(source, &self.cache_destination).await {
            log::error!("Failed to copy theme to final destination: {e}");
            return ApplyOutcome::PartialFailure;
        }

        record.last_published = file_digest(&self.cache_destination).await;
        log::info!(
            "Published {variant} theme to {} ({})",
            self.cache_destination.display(),
            record
                .last_published
                .map(|h| h.short())
                .unwrap_or_else(|| "unreadable".to_string())
        );
        drop(record);

        self.signal_consumers().await;
        ApplyOutcome::Published
    }

    async fn wait_stable(&self, path: &std::path::Path) -> bool {
        self.waiter
            .wait_stable(
                path,
                self.timings.stability_timeout,
                self.timings.poll_interval,
            )
            .await
    }

    /// Send the reload signal to every running consumer. Returns how many
    /// processes received it.
    pub async fn signal_consumers(&self) -> usize {
        let pids = match self.processes.find_by_name(&self.consumer_name).await {
            Ok(pids) => pids,
            Err(e) => {
                log::warn!("Could not look up {} processes: {e}", self.consumer_name);
                return 0;
            }
        };

        if pids.is_empty() {
            log::debug!("No running {} instances to signal", self.consumer_name);
            return 0;
        }

        let mut delivered = 0;
        for pid in pids {
            match self.processes.send_reload(pid).await {
                Ok(()) => delivered += 1,
                Err(e) => log::warn!("{e}"),
            }
        }

        if delivered > 0 {
            log::info!(
                "Signaled {delivered} {} instance(s) to reload",
                self.consumer_name
            );
        }
        delivered
    }
}

/// Owns the pipeline state for the daemon's lifetime.
///
/// Shared between the initial apply and the watcher. A trigger that arrives
/// while another apply is running is dropped, not queued, so an in-progress
/// color change is never re-read half way.
pub struct PipelineWorker {
    resolver: ThemeResolver,
    pipeline: ApplyPipeline,
    processing: AtomicBool,
    started: AtomicU64,
}

impl PipelineWorker {
    pub fn new(resolver: ThemeResolver, pipeline: ApplyPipeline) -> Self {
        Self {
            resolver,
            pipeline,
            processing: AtomicBool::new(false),
            started: AtomicU64::new(0),
        }
    }

    pub fn shared(resolver: ThemeResolver, pipeline: ApplyPipeline) -> Arc<Self> {
        Arc::new(Self::new(resolver, pipeline))
    }

    pub fn paths(&self) -> &ThemePaths {
        self.resolver.paths()
    }

    pub fn pipeline(&self) -> &ApplyPipeline {
        &self.pipeline
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Number of applies that got past the reentrancy guard
    pub fn applies_started(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    /// Resolve the active variant and apply it.
    ///
    /// `Ok(None)` means another apply was in flight and this trigger was
    /// dropped.
    pub async fn run_once(&self) -> Result<Option<ApplyOutcome>, ResolveError> {
        let Some(_guard) = ProcessingGuard::claim(&self.processing) else {
            log::info!("Already processing an update, skipping");
            return Ok(None);
        };
        self.started.fetch_add(1, Ordering::SeqCst);

        let (variant, paths) = self.resolver.resolve().await?;
        let outcome = self.pipeline.apply(variant, paths).await;
        Ok(Some(outcome))
    }
}

struct ProcessingGuard<'a>(&'a AtomicBool);

impl<'a> ProcessingGuard<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
