use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub mod app;
pub mod consumer;
pub mod limits;
pub mod paths;
pub mod timings;
pub mod validation;

pub use app::AppConfig;
pub use consumer::ConsumerConfig;
pub use paths::PathsConfig;
pub use timings::TimingsConfig;
pub use validation::{ConfigLoadResult, ConfigValidationError};

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const ENV_PREFIX: &str = "WALSYNC";

/// Global configuration, loaded once on first access
static CONFIG: std::sync::OnceLock<ConfigLoadResult> = std::sync::OnceLock::new();

/// `~/.config/walsync`
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("walsync"))
}

pub fn default_config_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Load configuration from an optional TOML file, with `WALSYNC__SECTION__KEY`
/// environment variables taking precedence.
///
/// A missing file is not an error; every setting has a default.
pub fn load_config_from(file: Option<&Path>) -> ConfigLoadResult {
    let mut builder = Config::builder();

    if let Some(file) = file {
        builder = builder.add_source(
            File::from(file.to_path_buf())
                .format(FileFormat::Toml)
                .required(false),
        );
    }

    let env_source = Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true);

    let config = match builder.add_source(env_source).build() {
        Ok(config) => config,
        Err(e) => {
            return ConfigLoadResult::LoadError(format!(
                "Configuration loading failed: {e}. Please check your config.toml file and environment variables."
            ));
        }
    };

    match config.try_deserialize::<AppConfig>() {
        Ok(app_config) => ConfigLoadResult::Success(Box::new(app_config)),
        Err(e) => ConfigLoadResult::DeserializeError(format!("Failed to deserialize config: {e}")),
    }
}

fn load_config() -> ConfigLoadResult {
    let file = default_config_file();
    load_config_from(file.as_deref())
}

pub fn get_config() -> &'static ConfigLoadResult {
    CONFIG.get_or_init(load_config)
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    level: Option<String>,
    file: Option<String>,
}

impl LoggingConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or("info")
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }
}
