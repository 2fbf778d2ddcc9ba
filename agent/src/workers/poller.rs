//! Polling trigger source
//!
//! On a fixed interval, enqueues a polling deployment for every project that
//! is ready and has polling enabled. Projects in `deploying` or `error` are
//! never auto-enqueued; a failing project waits for an explicit manual or
//! webhook trigger rather than being retried on a timer.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tracing::{debug, info};

use crate::deploy::queue::Dispatcher;
use crate::models::project::{ProjectStatus, TriggerKind};
use crate::storage::projects::ProjectStore;

/// Poller worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Polling interval
    pub interval: Duration,

    /// Initial delay before the first cycle
    pub initial_delay: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            initial_delay: Duration::from_secs(5),
        }
    }
}

/// Run the poller worker
pub async fn run<S, F>(
    options: &Options,
    store: &ProjectStore,
    dispatcher: &Arc<Dispatcher>,
    sleep_fn: S,
    mut shutdown_signal: BoxFuture<'static, ()>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!(
        "Poller worker starting with {:?} interval...",
        options.interval
    );

    // Initial delay
    sleep_fn(options.initial_delay).await;

    loop {
        // Check for shutdown
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Poller worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {
                // Continue with poll
            }
        }

        debug!("Starting polling cycle");

        for (name, project) in store.list().await {
            if project.status == ProjectStatus::Ready && project.polling_enabled {
                dispatcher.submit(&name, TriggerKind::Polling);
            }
        }
    }
}
