use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::platform::types::PullRequestRef;
use crate::server::SharedReconciler;
use crate::workflow::{PullRequestEvent, ReconciliationOutcome};

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    active: Mutex<HashMap<u64, PullRequestRef>>,
    idle: Notify,
}

/// Tracks workflows that are still running, so shutdown can wait for them.
#[derive(Default, Clone)]
pub struct InFlight {
    inner: Arc<Inner>,
}

/// Removes its workflow from the tracker when dropped, including on panic.
pub struct InFlightGuard {
    inner: Arc<Inner>,
    id: u64,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, pr: &PullRequestRef) -> InFlightGuard {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.active().insert(id, pr.clone());
        InFlightGuard {
            inner: Arc::clone(&self.inner),
            id,
        }
    }

    pub fn snapshot(&self) -> Vec<PullRequestRef> {
        self.active().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.active().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until no workflow is running or `grace` elapses. Returns whatever
    /// is still running.
    pub async fn wait_idle(&self, grace: Duration) -> Vec<PullRequestRef> {
        let deadline = tokio::time::Instant::now() + grace;
        loop {
            let notified = self.inner.idle.notified();
            if self.is_empty() {
                return Vec::new();
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.snapshot();
            }
        }
    }

    fn active(&self) -> std::sync::MutexGuard<'_, HashMap<u64, PullRequestRef>> {
        self.inner.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let now_idle = {
            let mut active = self.inner.active.lock().unwrap_or_else(|e| e.into_inner());
            active.remove(&self.id);
            active.is_empty()
        };
        if now_idle {
            self.inner.idle.notify_waiters();
        }
    }
}

/// Run one reconciliation on its own task, off the request path.
pub fn spawn_reconcile(
    reconciler: SharedReconciler,
    in_flight: &InFlight,
    event: PullRequestEvent,
) -> JoinHandle<ReconciliationOutcome> {
    let guard = in_flight.begin(&event.pr);
    tokio::spawn(async move {
        let _guard = guard;
        reconciler.reconcile(&event).await
    })
}
