//! Trailing-edge debouncing of persistence work.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tracing::trace;

struct Pending {
    generation: u64,
    abort: Option<AbortHandle>,
}

/// Coalesces bursts of work per key into one run after a quiet period.
///
/// Scheduling under a key that already has work waiting replaces that work
/// and restarts the delay. Once a task's delay has elapsed it can no longer
/// be cancelled, but [`wait_idle`](Self::wait_idle) waits for it. Tasks
/// under one key never run concurrently.
#[derive(Clone, Default)]
pub struct Debouncer {
    pending: Arc<DashMap<String, Pending>>,
    running: Arc<DashMap<String, Arc<Mutex<()>>>>,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` once `delay` has passed without another call for `key`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, key: &str, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let replaced = self.pending.insert(
            key.to_string(),
            Pending {
                generation,
                abort: None,
            },
        );
        if let Some(abort) = replaced.and_then(|previous| previous.abort) {
            abort.abort();
            trace!(key, "replaced pending task");
        }

        let pending = Arc::clone(&self.pending);
        let gate = self.gate(key);
        let owned_key = key.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _running = gate.lock().await;
            let still_current = pending
                .remove_if(&owned_key, |_, entry| entry.generation == generation)
                .is_some();
            if still_current {
                task.await;
            }
        });

        if let Some(mut entry) = self.pending.get_mut(key) {
            if entry.generation == generation {
                entry.abort = Some(handle.abort_handle());
            }
        }
    }

    /// Drop the work waiting under `key`. Returns whether there was any.
    pub fn cancel(&self, key: &str) -> bool {
        match self.pending.remove(key) {
            Some((_, entry)) => {
                if let Some(abort) = entry.abort {
                    abort.abort();
                }
                true
            }
            None => false,
        }
    }

    /// Wait until no task for `key` is running.
    ///
    /// Work still waiting out its delay is not affected.
    pub async fn wait_idle(&self, key: &str) {
        let gate = self.gate(key);
        let _idle = gate.lock().await;
    }

    /// [`cancel`](Self::cancel), then [`wait_idle`](Self::wait_idle).
    pub async fn cancel_and_wait(&self, key: &str) -> bool {
        let cancelled = self.cancel(key);
        self.wait_idle(key).await;
        cancelled
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    fn gate(&self, key: &str) -> Arc<Mutex<()>> {
        Arc::clone(&self.running.entry(key.to_string()).or_default())
    }
}
