//! Error types for the deployment agent

use thiserror::Error;

/// Main error type for the deployment agent
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Remote fetch error: {0}")]
    FetchError(String),

    #[error("Deploy script error: {0}")]
    ScriptError(String),

    #[error("Service restart error: {0}")]
    ServiceError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Internal(err.to_string())
    }
}
