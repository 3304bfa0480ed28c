use serde::Deserialize;
use std::time::Duration;
use walsync_engine::pipeline::DEFAULT_CONSUMER_NAME;

/// The editor that loads the published theme
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsumerConfig {
    /// Process name matched against `/proc/<pid>/comm` (default: nvim)
    process_name: Option<String>,
    /// How often to check that the editor is still running (default: 5000ms)
    liveness_interval_ms: Option<u64>,
}

impl ConsumerConfig {
    pub fn process_name(&self) -> &str {
        self.process_name.as_deref().unwrap_or(DEFAULT_CONSUMER_NAME)
    }

    pub fn liveness_interval_ms(&self) -> u64 {
        self.liveness_interval_ms.unwrap_or(5000)
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms())
    }
}
