//! Application configuration options

use std::time::Duration;

use crate::storage::layout::StorageLayout;
use crate::workers::poller;

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Storage configuration
    pub storage: StorageOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Enable the polling scheduler
    pub enable_poller: bool,

    /// Poller worker options
    pub poller: poller::Options,

    /// Webhook shared secret; None disables signature verification
    pub webhook_secret: Option<String>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            storage: StorageOptions::default(),
            server: ServerOptions::default(),
            enable_poller: true,
            poller: poller::Options::default(),
            webhook_secret: None,
        }
    }
}

/// Lifecycle options for the agent
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Storage configuration options
#[derive(Debug, Clone, Default)]
pub struct StorageOptions {
    /// Storage layout paths
    pub layout: StorageLayout,
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3004,
        }
    }
}
