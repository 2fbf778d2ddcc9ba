//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::deploy::executor::DeploymentExecutor;
use crate::deploy::queue::Dispatcher;
use crate::deploy::runner::ShellRunner;
use crate::errors::AgentError;
use crate::storage::deploy_log::DeployLogs;
use crate::storage::layout::StorageLayout;
use crate::storage::projects::ProjectStore;

/// Main application state
pub struct AppState {
    /// Project store
    pub store: Arc<ProjectStore>,

    /// Deployment queue dispatcher
    pub dispatcher: Arc<Dispatcher>,

    /// Per-project deploy logs
    pub logs: Arc<DeployLogs>,
}

impl AppState {
    /// Initialize application state
    pub async fn init(layout: &StorageLayout) -> Result<Self, AgentError> {
        info!("Initializing application state...");

        layout.setup().await?;

        let store = Arc::new(ProjectStore::load_or_default(layout.projects_file()).await?);
        let logs = Arc::new(DeployLogs::new(layout.logs_dir()));

        let runner = Arc::new(ShellRunner);
        let executor = Arc::new(DeploymentExecutor::new(
            store.clone(),
            runner,
            logs.clone(),
        ));
        let dispatcher = Dispatcher::new(executor);

        Ok(Self {
            store,
            dispatcher,
            logs,
        })
    }
}
