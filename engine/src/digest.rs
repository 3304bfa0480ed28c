use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// SHA-256 digest of a file's contents
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    /// First 12 hex characters, enough to tell hashes apart in logs
    pub fn short(&self) -> String {
        self.to_string()[..12].to_string()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short())
    }
}

/// Hash the file at `path`.
///
/// Returns `None` when the file cannot be read (missing, permission denied,
/// or removed between the existence check and the read).
pub async fn file_digest(path: &Path) -> Option<ContentHash> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(ContentHash::of_bytes(&bytes)),
        Err(e) => {
            log::trace!("Cannot hash {}: {e}", path.display());
            None
        }
    }
}
