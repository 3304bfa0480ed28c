use crate::clock::SharedClock;
use crate::digest::file_digest;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_STABILITY_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Waits for a file written by another process to stop changing.
///
/// pywal writes its cache files without rename-into-place, so a reader that
/// reacts to the first change event can see a half-written file.
#[derive(Clone)]
pub struct StabilityWaiter {
    clock: SharedClock,
}

impl StabilityWaiter {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    /// Returns `false` right away when `path` does not exist.
    ///
    /// Otherwise returns `true` once two content-hash samples taken
    /// `poll_interval` apart are equal, or once `timeout` has elapsed. The
    /// writer may never signal completion, so a timeout still means "go ahead".
    pub async fn wait_stable(
        &self,
        path: &Path,
        timeout: Duration,
        poll_interval: Duration,
    ) -> bool {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return false;
        }

        let mut last = file_digest(path).await;
        let mut waited = Duration::ZERO;

        while waited < timeout {
            self.clock.sleep(poll_interval).await;
            waited += poll_interval;

            let current = file_digest(path).await;
            if current == last {
                log::debug!("{} stable after {waited:?}", path.display());
                return true;
            }
            last = current;
        }

        log::debug!(
            "{} still changing after {timeout:?}, proceeding anyway",
            path.display()
        );
        true
    }
}
