use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

use crate::platform::types::PullRequestRef;

type LockMap = HashMap<PullRequestRef, Arc<tokio::sync::Mutex<()>>>;

/// Per-pull-request mutual exclusion.
///
/// Workflows for different pull requests never contend. Entries are removed
/// once nobody holds or waits on them.
#[derive(Default, Clone)]
pub struct PrLocks {
    inner: Arc<Mutex<LockMap>>,
}

/// Held for the duration of one workflow.
pub struct PrGuard {
    locks: Arc<Mutex<LockMap>>,
    key: PullRequestRef,
    mutex: Arc<tokio::sync::Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl PrLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, pr: &PullRequestRef) -> PrGuard {
        let mutex = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(map.entry(pr.clone()).or_default())
        };

        let guard = Arc::clone(&mutex).lock_owned().await;
        PrGuard {
            locks: Arc::clone(&self.inner),
            key: pr.clone(),
            mutex,
            guard: Some(guard),
        }
    }

    /// Number of pull requests with a live lock entry.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for PrGuard {
    fn drop(&mut self) {
        self.guard.take();
        let mut map = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Only the map and this guard still reference the mutex.
        if Arc::strong_count(&self.mutex) == 2 {
            map.remove(&self.key);
        }
    }
}
