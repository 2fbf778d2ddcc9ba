//! Settings file management

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AgentError;
use crate::filesys::file::File;
use crate::logs::LogLevel;

/// Agent settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Polling interval in minutes
    #[serde(default = "default_polling_interval")]
    pub polling_interval_mins: u64,

    /// Enable the polling scheduler
    #[serde(default = "default_true")]
    pub enable_poller: bool,

    /// Shared secret for webhook signature verification.
    /// Absent means inbound webhooks are not signature-checked.
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Declared deployment concurrency ceiling. The serialized drain loop
    /// never runs more than one deployment at a time, so any value here is
    /// honored trivially; a bounded-parallelism redesign must read it.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_deployments: u32,
}

fn default_true() -> bool {
    true
}

fn default_polling_interval() -> u64 {
    5
}

fn default_max_concurrent() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            server: ServerSettings::default(),
            polling_interval_mins: default_polling_interval(),
            enable_poller: true,
            webhook_secret: None,
            max_concurrent_deployments: default_max_concurrent(),
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when the file is missing or
    /// corrupt. The fallback is persisted so the next start reads a file.
    pub async fn load_or_default(file: &File) -> Result<Self, AgentError> {
        match file.read_json::<Settings>().await {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!(
                    "Unable to read settings file ({}), using defaults: {}",
                    file.path().display(),
                    e
                );
                let settings = Settings::default();
                file.write_json(&settings).await?;
                Ok(settings)
            }
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3004
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}
