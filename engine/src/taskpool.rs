use std::sync::Arc;

use futures_util::Future;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Runs background futures with a concurrency cap.
///
/// Dropping or closing the pool cancels everything still running.
pub struct TaskPool {
    n_tasks: usize,
    semaphore: Arc<Semaphore>,
    cancel_token: CancellationToken,
}

impl TaskPool {
    pub fn new(n_tasks: usize) -> TaskPool {
        let n_tasks = n_tasks.max(1);
        let semaphore = Arc::new(Semaphore::new(n_tasks));
        let cancel_token = CancellationToken::new();

        TaskPool {
            n_tasks,
            semaphore,
            cancel_token,
        }
    }

    pub fn execute<F, T>(&self, func: F)
    where
        F: Future<Output = T> + Send + 'static,
        T: Send,
    {
        if self.cancel_token.is_cancelled() {
            log::debug!("Task pool closed, dropping task");
            return;
        }

        let semaphore = self.semaphore.clone();
        let token = self.cancel_token.clone();
        tokio::spawn(async move {
            let main = async {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                func.await;
            };

            tokio::select! {
                () = main => {},
                () = token.cancelled() => {}
            }
        });
    }

    /// Wait until no task holds a permit.
    ///
    /// Tasks spawned but not yet started may still start afterwards; call
    /// this once no more tasks are being submitted.
    pub async fn wait_idle(&self) {
        let n = u32::try_from(self.n_tasks).unwrap_or(u32::MAX);
        // A closed semaphore has nothing left to wait for
        if let Ok(permits) = self.semaphore.acquire_many(n).await {
            drop(permits);
        }
    }

    pub fn close(&self) {
        self.semaphore.close();
        self.cancel_token.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.close();
    }
}
