//! Time source used by every bounded wait in the engine.
//!
//! Stability polling, the settle delay, debouncing and lock retries all go
//! through [`Clock`], so tests can swap in a [`ManualClock`] and run the whole
//! pipeline without real sleeps.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Shared handle to a clock implementation
pub type SharedClock = Arc<dyn Clock>;

#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant on this clock
    fn now(&self) -> Instant;

    /// Suspend the caller for `duration` of clock time
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `tokio::time`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn shared() -> SharedClock {
        Arc::new(SystemClock)
    }
}

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Callback run after every [`ManualClock::sleep`], with the total elapsed time
pub type SleepHook = Box<dyn FnMut(Duration) + Send>;

/// Virtual clock for tests.
///
/// `sleep` returns immediately after moving the clock forward, then runs the
/// optional hook so a test can script what an external writer does at a
/// given point in time.
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
    hook: Mutex<Option<SleepHook>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            hook: Mutex::new(None),
        }
    }

    pub fn with_sleep_hook<F>(self, hook: F) -> Self
    where
        F: FnMut(Duration) + Send + 'static,
    {
        if let Ok(mut guard) = self.hook.lock() {
            *guard = Some(Box::new(hook));
        }
        self
    }

    /// Total virtual time that has passed since creation
    pub fn elapsed(&self) -> Duration {
        self.elapsed.lock().map(|e| *e).unwrap_or_default()
    }

    /// Move the clock forward without running the sleep hook
    pub fn advance(&self, duration: Duration) -> Duration {
        match self.elapsed.lock() {
            Ok(mut elapsed) => {
                *elapsed += duration;
                *elapsed
            }
            Err(_) => Duration::ZERO,
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualClock")
            .field("elapsed", &self.elapsed())
            .finish()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        let elapsed = self.advance(duration);
        if let Ok(mut hook) = self.hook.lock() {
            if let Some(hook) = hook.as_mut() {
                hook(elapsed);
            }
        }
        tokio::task::yield_now().await;
    }
}
