use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while acquiring the single-instance lock.
///
/// Only [`RetriesExhausted`] and [`Io`] are fatal for the daemon. Finding a
/// live owner is not an error and is reported through
/// [`LockOutcome::AlreadyRunning`](crate::lock::LockOutcome::AlreadyRunning).
///
/// [`RetriesExhausted`]: LockError::RetriesExhausted
/// [`Io`]: LockError::Io
#[derive(Debug, Error)]
pub enum LockError {
    /// Every attempt found a lock file that was removed as stale, but another
    /// process re-created it before this one could.
    #[error("Could not acquire lock {path} after {attempts} attempts")]
    RetriesExhausted { path: PathBuf, attempts: u32 },

    /// The lock file could not be created for a reason other than it
    /// already existing (permissions, missing directory, ...).
    #[error("Failed to create lock file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors raised while reading the palette cache.
///
/// Both variants are fatal when they happen on the first resolution at
/// startup; later occurrences are logged and the triggering event is ignored.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Colors file not readable: {path}: {source}")]
    MissingPalette {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Colors file is empty: {path}")]
    EmptyPalette { path: PathBuf },
}

/// A palette line that is not a 6-digit hex triplet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaletteError {
    #[error("Invalid hex color format '{0}'")]
    InvalidLength(String),

    #[error("Invalid {component} component in '{value}'")]
    InvalidComponent {
        component: &'static str,
        value: String,
    },
}

/// File copy failures. Always recoverable: callers log them and carry on,
/// except for the final publish which turns into
/// [`ApplyOutcome::PartialFailure`](crate::pipeline::ApplyOutcome::PartialFailure).
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("Source file not found: {path}")]
    SourceMissing { path: PathBuf },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

/// Errors from setting up filesystem notifications.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to create filesystem watcher: {0}")]
    Backend(#[from] notify::Error),

    #[error("Failed to watch {path}: {source}")]
    Subscribe {
        path: PathBuf,
        source: notify::Error,
    },
}

/// Errors from the local process table.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to list processes: {0}")]
    Enumerate(#[source] std::io::Error),

    #[error("Failed to signal process {pid}: {source}")]
    Signal { pid: i32, source: nix::Error },
}
