use serde::Deserialize;
use std::time::Duration;
use walsync_engine::pipeline::PipelineTimings;

/// Waits and retry bounds used by the lock, the watcher and the pipeline
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimingsConfig {
    stability_timeout_ms: Option<u64>,
    stability_poll_ms: Option<u64>,
    settle_delay_ms: Option<u64>,
    debounce_ms: Option<u64>,
    lock_retry_delay_ms: Option<u64>,
    lock_attempts: Option<u32>,
}

impl TimingsConfig {
    pub fn stability_timeout_ms(&self) -> u64 {
        self.stability_timeout_ms.unwrap_or(2000)
    }

    pub fn stability_poll_ms(&self) -> u64 {
        self.stability_poll_ms.unwrap_or(100)
    }

    pub fn settle_delay_ms(&self) -> u64 {
        self.settle_delay_ms.unwrap_or(300)
    }

    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms.unwrap_or(500)
    }

    pub fn lock_retry_delay_ms(&self) -> u64 {
        self.lock_retry_delay_ms.unwrap_or(100)
    }

    pub fn lock_attempts(&self) -> u32 {
        self.lock_attempts.unwrap_or(3)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms())
    }

    pub fn lock_retry_delay(&self) -> Duration {
        Duration::from_millis(self.lock_retry_delay_ms())
    }

    pub fn pipeline_timings(&self) -> PipelineTimings {
        PipelineTimings {
            stability_timeout: Duration::from_millis(self.stability_timeout_ms()),
            poll_interval: Duration::from_millis(self.stability_poll_ms()),
            settle_delay: Duration::from_millis(self.settle_delay_ms()),
        }
    }
}
