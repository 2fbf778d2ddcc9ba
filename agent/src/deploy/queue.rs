//! Deployment queue and drain loop
//!
//! A single FIFO queue accepts entries from all trigger sources. At most one
//! drain task is ever running: submitting to an idle queue starts it, and it
//! runs to exhaustion before going idle again. Entries execute strictly in
//! arrival order, one at a time, across all projects — the deploy procedure
//! owns the working tree while it runs, so deployments are never interleaved.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::models::project::{QueueEntry, TriggerKind};

/// Consumes dequeued entries; the dispatcher's seam to the executor
#[async_trait]
pub trait Execute: Send + Sync {
    /// Execute one deployment entry. Must not panic; failures are recorded
    /// against the project, never surfaced to the drain loop.
    async fn execute(&self, entry: QueueEntry);
}

struct Inner {
    entries: VecDeque<QueueEntry>,
    draining: bool,
}

/// Serializes triggers into a single ordered stream of deployments
pub struct Dispatcher {
    inner: Mutex<Inner>,
    executor: Arc<dyn Execute>,
}

impl Dispatcher {
    pub fn new(executor: Arc<dyn Execute>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                entries: VecDeque::new(),
                draining: false,
            }),
            executor,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The executor catches its own panics' causes as errors, so a
        // poisoned lock still holds a consistent queue
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue a deployment trigger. Non-blocking and safe for concurrent
    /// producers; duplicate triggers are preserved, not coalesced.
    pub fn submit(self: &Arc<Self>, project_name: &str, trigger: TriggerKind) {
        let entry = QueueEntry::new(project_name, trigger);
        debug!("Queueing deployment for {} ({:?})", project_name, trigger);

        let start_drain = {
            let mut inner = self.lock();
            inner.entries.push_back(entry);
            if inner.draining {
                false
            } else {
                inner.draining = true;
                true
            }
        };

        if start_drain {
            let dispatcher = self.clone();
            tokio::spawn(async move {
                dispatcher.drain().await;
            });
        }
    }

    /// Drain the queue to exhaustion, then go idle
    async fn drain(self: Arc<Self>) {
        loop {
            let entry = {
                let mut inner = self.lock();
                match inner.entries.pop_front() {
                    Some(entry) => entry,
                    None => {
                        inner.draining = false;
                        debug!("Deployment queue drained, going idle");
                        return;
                    }
                }
            };

            self.executor.execute(entry).await;
        }
    }

    /// Drop all queued entries for a deleted project
    pub fn purge(&self, project_name: &str) -> usize {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|e| e.project_name != project_name);
        let purged = before - inner.entries.len();

        if purged > 0 {
            info!("Purged {} queued entries for {}", purged, project_name);
        }
        purged
    }

    /// Number of entries waiting (excludes the one currently executing)
    pub fn queue_len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the drain loop is currently active
    pub fn is_draining(&self) -> bool {
        self.lock().draining
    }
}
