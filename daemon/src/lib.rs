//! # Walsync Daemon Library
//!
//! Background daemon that republishes the Neovim base46 theme whenever pywal
//! renders a new palette, and exits once no editor is left to reload.
//!
//! ## Modules
//!
//! - [`config`] - Layered configuration (defaults, `config.toml`, environment)
//! - [`logger`] - Logging setup
//! - [`supervisor`] - Lock, initial apply, watch loop and shutdown
//!
//! This library interface enables integration testing by providing access to internal modules.

pub mod config;
pub mod logger;
pub mod supervisor;
