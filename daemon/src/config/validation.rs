use super::app::AppConfig;

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid consumer.process_name: must not be empty")]
    EmptyProcessName,
    #[error(
        "Invalid consumer.liveness_interval_ms: {configured} (min: {min_limit}, max: {max_limit})"
    )]
    LivenessInterval {
        configured: u64,
        min_limit: u64,
        max_limit: u64,
    },
    #[error("Invalid timings.stability_poll_ms: {configured} (min: 1, max: {limit})")]
    PollInterval { configured: u64, limit: u64 },
    #[error("Invalid timings.{name}: {configured} (limit: {limit})")]
    WaitTooLong {
        name: &'static str,
        configured: u64,
        limit: u64,
    },
    #[error("Invalid timings.lock_attempts: {configured} (min: 1, max: {limit})")]
    LockAttempts { configured: u32, limit: u32 },
}

impl ConfigValidationError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigValidationError::EmptyProcessName => "Editor process name is empty!\n\n\
                Please set consumer.process_name in config.toml, or remove it to use the default (nvim)."
                .to_string(),
            ConfigValidationError::LivenessInterval {
                configured,
                min_limit,
                max_limit,
            } => {
                format!(
                    "Editor liveness interval out of range!\n\n\
                    Your configured value: {configured} ms\n\
                    Valid range: {min_limit} - {max_limit} ms\n\n\
                    Please update consumer.liveness_interval_ms in config.toml."
                )
            }
            ConfigValidationError::PollInterval { configured, limit } => {
                format!(
                    "Stability poll interval out of range!\n\n\
                    Your configured value: {configured} ms\n\
                    Valid range: 1 - {limit} ms\n\n\
                    Please update timings.stability_poll_ms in config.toml."
                )
            }
            ConfigValidationError::WaitTooLong {
                name,
                configured,
                limit,
            } => {
                format!(
                    "Wait too long!\n\n\
                    Your configured value: {configured} ms\n\
                    Maximum: {limit} ms\n\n\
                    Please update timings.{name} in config.toml."
                )
            }
            ConfigValidationError::LockAttempts { configured, limit } => {
                format!(
                    "Lock attempts out of range!\n\n\
                    Your configured value: {configured}\n\
                    Valid range: 1 - {limit}\n\n\
                    Please update timings.lock_attempts in config.toml."
                )
            }
        }
    }
}

/// Configuration loading result
#[derive(Debug)]
pub enum ConfigLoadResult {
    Success(Box<AppConfig>),
    LoadError(String),
    DeserializeError(String),
}
