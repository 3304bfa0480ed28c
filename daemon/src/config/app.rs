use super::{
    LoggingConfig, consumer::ConsumerConfig, limits::*, paths::PathsConfig,
    timings::TimingsConfig, validation::ConfigValidationError,
};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    paths: PathsConfig,
    #[serde(default)]
    consumer: ConsumerConfig,
    #[serde(default)]
    timings: TimingsConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl AppConfig {
    /// Validate the configuration against defined limits
    pub fn validate(&self) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        if self.consumer.process_name().trim().is_empty() {
            errors.push(ConfigValidationError::EmptyProcessName);
        }

        let liveness = self.consumer.liveness_interval_ms();
        if !(MIN_LIVENESS_INTERVAL_MS..=MAX_LIVENESS_INTERVAL_MS).contains(&liveness) {
            errors.push(ConfigValidationError::LivenessInterval {
                configured: liveness,
                min_limit: MIN_LIVENESS_INTERVAL_MS,
                max_limit: MAX_LIVENESS_INTERVAL_MS,
            });
        }

        let poll = self.timings.stability_poll_ms();
        if poll == 0 || poll > MAX_PIPELINE_WAIT_MS {
            errors.push(ConfigValidationError::PollInterval {
                configured: poll,
                limit: MAX_PIPELINE_WAIT_MS,
            });
        }

        for (name, configured) in [
            ("stability_timeout_ms", self.timings.stability_timeout_ms()),
            ("settle_delay_ms", self.timings.settle_delay_ms()),
            ("debounce_ms", self.timings.debounce_ms()),
            ("lock_retry_delay_ms", self.timings.lock_retry_delay_ms()),
        ] {
            if configured > MAX_PIPELINE_WAIT_MS {
                errors.push(ConfigValidationError::WaitTooLong {
                    name,
                    configured,
                    limit: MAX_PIPELINE_WAIT_MS,
                });
            }
        }

        let attempts = self.timings.lock_attempts();
        if !(1..=MAX_LOCK_ATTEMPTS).contains(&attempts) {
            errors.push(ConfigValidationError::LockAttempts {
                configured: attempts,
                limit: MAX_LOCK_ATTEMPTS,
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn paths(&self) -> &PathsConfig {
        &self.paths
    }

    pub fn consumer(&self) -> &ConsumerConfig {
        &self.consumer
    }

    pub fn timings(&self) -> &TimingsConfig {
        &self.timings
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }
}
