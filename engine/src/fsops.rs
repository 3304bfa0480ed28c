use crate::common::CopyError;
use std::path::{Path, PathBuf};

/// What [`copy_file`] ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    Copied,
    /// `skip_if_exists` was set and the destination was already there
    AlreadyPresent,
}

/// Copy `src` to `dst`, creating the destination's parent directories.
///
/// With `skip_if_exists` an existing destination is left untouched. The copy
/// overwrites in place; use [`publish_file`] when another process reads `dst`.
pub async fn copy_file(
    src: &Path,
    dst: &Path,
    skip_if_exists: bool,
) -> Result<CopyStatus, CopyError> {
    if skip_if_exists && tokio::fs::try_exists(dst).await.unwrap_or(false) {
        log::debug!("File already exists at {}, skipping copy", dst.display());
        return Ok(CopyStatus::AlreadyPresent);
    }

    if !tokio::fs::try_exists(src).await.unwrap_or(false) {
        return Err(CopyError::SourceMissing {
            path: src.to_path_buf(),
        });
    }

    if let Some(parent) = dst.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| CopyError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    tokio::fs::copy(src, dst)
        .await
        .map_err(|source| CopyError::Copy {
            from: src.to_path_buf(),
            to: dst.to_path_buf(),
            source,
        })?;

    log::info!("File copied from {} to {}", src.display(), dst.display());
    Ok(CopyStatus::Copied)
}

/// Atomically replace `dst` with a copy of `src`.
///
/// The content is copied to a hidden sibling of `dst` first and then renamed
/// over it, so a concurrent reader sees either the old or the new file.
pub async fn publish_file(src: &Path, dst: &Path) -> Result<(), CopyError> {
    let file_name = dst
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "published".to_string());
    let staging = StagingFile::new(dst.with_file_name(format!(".{file_name}.walsync-tmp")));

    copy_file(src, staging.path(), false).await?;

    tokio::fs::rename(staging.path(), dst)
        .await
        .map_err(|source| CopyError::Copy {
            from: src.to_path_buf(),
            to: dst.to_path_buf(),
            source,
        })?;

    staging.persist();
    Ok(())
}

/// Staging copy that is removed on drop unless it was renamed into place
struct StagingFile {
    path: PathBuf,
    armed: bool,
}

impl StagingFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn persist(mut self) {
        self.armed = false;
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => log::debug!("Removed staging file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Could not remove {}: {e}", self.path.display()),
        }
    }
}
