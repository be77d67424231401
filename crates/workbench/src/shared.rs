use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::error::{Result, WorkbenchError};

type BootFuture<S> = Pin<Box<dyn Future<Output = Result<S>> + Send>>;
type BootFn<S> = dyn Fn() -> BootFuture<S> + Send + Sync;

/// Lazily booted sandbox shared by every caller.
///
/// The first `get` boots the instance; concurrent callers wait on the same
/// boot instead of starting their own. A failed boot leaves the handle
/// empty so the next `get` retries.
pub struct SharedSandbox<S> {
    cell: OnceCell<Arc<S>>,
    boot: Box<BootFn<S>>,
    boot_attempts: AtomicUsize,
}

impl<S> SharedSandbox<S>
where
    S: Send + Sync + 'static,
{
    pub fn new<F, Fut>(boot: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<S>> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            boot: Box::new(move || -> BootFuture<S> { Box::pin(boot()) }),
            boot_attempts: AtomicUsize::new(0),
        }
    }

    /// The shared instance, booting it on first use
    pub async fn get(&self) -> Result<Arc<S>> {
        self.cell
            .get_or_try_init(|| async {
                let attempt = self.boot_attempts.fetch_add(1, Ordering::SeqCst) + 1;
                log::debug!("booting sandbox (attempt {attempt})");
                let sandbox = (self.boot)().await?;
                Ok::<_, WorkbenchError>(Arc::new(sandbox))
            })
            .await
            .cloned()
    }

    /// The instance if it has already booted
    pub fn get_if_booted(&self) -> Option<Arc<S>> {
        self.cell.get().cloned()
    }

    /// How many boots were started, successful or not
    pub fn boot_attempts(&self) -> usize {
        self.boot_attempts.load(Ordering::SeqCst)
    }
}

impl<S> std::fmt::Debug for SharedSandbox<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSandbox")
            .field("booted", &self.cell.initialized())
            .field("boot_attempts", &self.boot_attempts.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySandbox;
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_callers_share_one_boot() {
        let shared = Arc::new(SharedSandbox::new(|| async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(MemorySandbox::new())
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                tokio::spawn(async move { shared.get().await })
            })
            .collect();

        let mut instances = Vec::new();
        for handle in handles {
            instances.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(shared.boot_attempts(), 1);
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert!(shared.get_if_booted().is_some());
    }

    #[tokio::test]
    async fn test_failed_boot_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let shared = SharedSandbox::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(WorkbenchError::boot("first boot fails"))
                } else {
                    Ok(MemorySandbox::new())
                }
            }
        });

        assert!(matches!(shared.get().await, Err(WorkbenchError::BootFailed(_))));
        assert!(shared.get_if_booted().is_none());
        assert!(shared.get().await.is_ok());
        assert_eq!(shared.boot_attempts(), 2);
    }
}
