//! Server state

use std::sync::Arc;
use std::time::Instant;

use crate::deploy::queue::Dispatcher;
use crate::storage::deploy_log::DeployLogs;
use crate::storage::projects::ProjectStore;

/// Server state shared across handlers
pub struct ServerState {
    pub store: Arc<ProjectStore>,
    pub dispatcher: Arc<Dispatcher>,
    pub logs: Arc<DeployLogs>,

    /// Shared secret for webhook signature verification; None skips the check
    pub webhook_secret: Option<String>,

    /// Process start time, for the status endpoint's uptime
    pub started_at: Instant,
}

impl ServerState {
    pub fn new(
        store: Arc<ProjectStore>,
        dispatcher: Arc<Dispatcher>,
        logs: Arc<DeployLogs>,
        webhook_secret: Option<String>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            logs,
            webhook_secret,
            started_at: Instant::now(),
        }
    }
}
