//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::AgentError;
use crate::server::handlers::{
    delete_project_handler, deploy_handler, health_handler, polling_handler, project_handler,
    project_log_handler, projects_handler, status_handler, version_handler, webhook_handler,
};
use crate::server::state::ServerState;

/// Build the router; separate from `serve` so tests can drive it directly
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Status and projects
        .route("/api/status", get(status_handler))
        .route("/api/projects", get(projects_handler))
        .route("/api/projects/{name}", get(project_handler))
        .route("/api/projects/{name}", delete(delete_project_handler))
        .route("/api/projects/{name}/polling", post(polling_handler))
        .route("/api/projects/{name}/log", get(project_log_handler))
        // Triggers
        .route("/api/deploy/{name}", post(deploy_handler))
        .route("/webhook/{name}", post(webhook_handler))
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), AgentError>>, AgentError> {
    let app = build_router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AgentError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| AgentError::ServerError(e.to_string()))
    });

    Ok(handle)
}
