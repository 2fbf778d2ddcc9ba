//! HTTP request handlers
//!
//! Handlers are queue producers and store readers only; they never execute
//! a deployment themselves and never touch a project's working tree.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::project::{Project, TriggerKind};
use crate::server::state::ServerState;
use crate::server::webhook::{ref_matches_branch, verify_signature};
use crate::utils::version_info;

/// JSON error body paired with a status code
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn not_found(name: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Project {} not found", name),
        }),
    )
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health check handler
pub async fn health_handler() -> impl IntoResponse {
    let version = version_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "depagent".to_string(),
        version: version.version,
    })
}

/// Version response
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

/// Agent status snapshot
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub projects: usize,
    pub queue_length: usize,
    pub is_draining: bool,
    pub uptime_secs: u64,
}

/// Status handler: project count, queue depth, drain loop activity
pub async fn status_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(StatusResponse {
        status: "running".to_string(),
        projects: state.store.count().await,
        queue_length: state.dispatcher.queue_len(),
        is_draining: state.dispatcher.is_draining(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// List all projects, in insertion order
pub async fn projects_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(state.store.list().await)
}

/// Deploy acknowledgement
#[derive(Debug, Serialize)]
pub struct DeployResponse {
    pub success: bool,
    pub message: String,
}

/// Manual trigger handler: enqueue unconditionally if the project exists.
/// Returns once queued; the outcome is observed via status and history.
pub async fn deploy_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    if state.store.get(&name).await.is_none() {
        return Err(not_found(&name));
    }

    state.dispatcher.submit(&name, TriggerKind::Manual);
    Ok(Json(DeployResponse {
        success: true,
        message: "Deployment queued".to_string(),
    }))
}

/// Webhook push-event payload; only the ref is inspected
#[derive(Debug, Deserialize)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,
}

/// Webhook acknowledgement
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub queued: bool,
}

/// Webhook trigger handler.
///
/// Signature verification runs over the exact raw body, before any parsing,
/// when a secret is configured and the signature header is present. Pushes
/// to refs other than the project's branch are accepted but not enqueued.
pub async fn webhook_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let Some(project) = state.store.get(&name).await else {
        return Err(not_found(&name));
    };

    if let Some(secret) = &state.webhook_secret {
        let signature = headers
            .get("x-hub-signature-256")
            .and_then(|v| v.to_str().ok());
        if let Some(signature) = signature {
            if let Err(e) = verify_signature(secret, signature, &body) {
                return Err((
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse {
                        error: e.to_string(),
                    }),
                ));
            }
        }
    }

    let payload: PushPayload = serde_json::from_slice(&body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("Invalid payload: {}", e),
            }),
        )
    })?;

    let queued = match payload.git_ref.as_deref() {
        Some(git_ref) if ref_matches_branch(git_ref, &project.branch) => {
            state.dispatcher.submit(&name, TriggerKind::Webhook);
            info!("Webhook deployment queued for {}", name);
            true
        }
        _ => false,
    };

    Ok(Json(WebhookResponse {
        success: true,
        queued,
    }))
}

/// Polling toggle request
#[derive(Debug, Deserialize)]
pub struct PollingRequest {
    pub enabled: bool,
}

/// Polling toggle response
#[derive(Debug, Serialize)]
pub struct PollingResponse {
    pub success: bool,
    pub polling_enabled: bool,
}

/// Enable or disable automatic polling for a project
pub async fn polling_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
    Json(request): Json<PollingRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let updated = state
        .store
        .update(&name, |p| p.polling_enabled = request.enabled)
        .await
        .map_err(internal_error)?;

    match updated {
        Some(project) => Ok(Json(PollingResponse {
            success: true,
            polling_enabled: project.polling_enabled,
        })),
        None => Err(not_found(&name)),
    }
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// Delete a project: remove it from the store, drop its queued entries and
/// its deploy log. The working tree on disk is left for the operator.
pub async fn delete_project_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    let removed = state.store.delete(&name).await.map_err(internal_error)?;
    if !removed {
        return Err(not_found(&name));
    }

    state.dispatcher.purge(&name);
    state.logs.remove(&name).await.map_err(internal_error)?;

    info!("Deleted project {}", name);
    Ok(Json(DeleteResponse { success: true }))
}

/// Log view query parameters
#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub lines: Option<usize>,
    pub search: Option<String>,
}

/// Log view response
#[derive(Debug, Serialize)]
pub struct LogResponse {
    pub success: bool,
    pub logs: Vec<String>,
}

/// Tail a project's deploy log
pub async fn project_log_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
    Query(query): Query<LogQuery>,
) -> Result<impl IntoResponse, (StatusCode, Json<ErrorResponse>)> {
    if state.store.get(&name).await.is_none() {
        return Err(not_found(&name));
    }

    let lines = query.lines.unwrap_or(200);
    let logs = state
        .logs
        .tail(&name, lines, query.search.as_deref())
        .await
        .map_err(internal_error)?;

    Ok(Json(LogResponse {
        success: true,
        logs,
    }))
}

/// Single project view, with history
pub async fn project_handler(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Result<Json<Project>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.get(&name).await {
        Some(project) => Ok(Json(project)),
        None => Err(not_found(&name)),
    }
}

fn internal_error(e: crate::errors::AgentError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
}
