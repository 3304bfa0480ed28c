//! # Walsync Engine
//!
//! Core library for keeping a Neovim base46 theme in sync with the pywal
//! palette. It decides between the dark and light variant, publishes the
//! matching theme file to the editor and asks running editors to reload.
//!
//! ## Modules
//!
//! - [`clock`] - Time source behind every bounded wait
//! - [`common`] - Error types shared across modules
//! - [`digest`] - SHA-256 content hashes of files
//! - [`fsops`] - Template copies and atomic theme publishing
//! - [`lock`] - PID-file single-instance lock
//! - [`palette`] - Hex color parsing and dark/light classification
//! - [`paths`] - Filesystem layout of pywal, templates and base46
//! - [`pipeline`] - The apply pipeline and its reentrancy-guarded worker
//! - [`process`] - Process table lookups and reload signals
//! - [`resolver`] - Reads the palette cache and picks the active variant
//! - [`stability`] - Waits for a file to stop changing
//! - [`taskpool`] - Task pool for running change handlers
//! - [`watcher`] - Filesystem notifications for the cache files

pub mod clock;
pub mod common;
pub mod digest;
pub mod fsops;
pub mod lock;
pub mod palette;
pub mod paths;
pub mod pipeline;
pub mod process;
pub mod resolver;
pub mod stability;
pub mod taskpool;
pub mod watcher;
