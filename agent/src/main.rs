//! Deployment Agent - Entry Point
//!
//! Continuously reconciles configured projects against their git remotes and
//! drives deployments through an external deploy script, triggered by
//! webhooks, polling, or manual API calls.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use depagent::app::options::{AppOptions, ServerOptions, StorageOptions};
use depagent::app::run::run;
use depagent::logs::{init_logging, LogOptions};
use depagent::storage::layout::StorageLayout;
use depagent::storage::settings::Settings;
use depagent::utils::version_info;
use depagent::workers::poller;

use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    let version = version_info();
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version).unwrap());
        return;
    }

    // Resolve the storage layout, honoring --base-dir=
    let layout = match cli_args.get("base-dir") {
        Some(dir) => StorageLayout::new(dir.clone()),
        None => StorageLayout::default(),
    };
    if let Err(e) = layout.setup().await {
        eprintln!("Unable to prepare storage at {}: {e}", layout.base_dir.display());
        return;
    }

    // Load settings, falling back to defaults on a missing or corrupt file
    let settings = match Settings::load_or_default(&layout.settings_file()).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Unable to load settings: {e}");
            return;
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: Some(layout.logs_dir().path().to_path_buf()),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        println!("Failed to initialize logging: {e}");
    }

    // Run the agent
    let options = AppOptions {
        storage: StorageOptions { layout },
        server: ServerOptions {
            host: settings.server.host.clone(),
            port: settings.server.port,
        },
        enable_poller: settings.enable_poller,
        poller: poller::Options {
            interval: Duration::from_secs(settings.polling_interval_mins * 60),
            ..Default::default()
        },
        webhook_secret: settings.webhook_secret.clone(),
        ..Default::default()
    };

    // Options are not logged wholesale: they carry the webhook secret
    info!(
        "Running deployment agent on {}:{} (poller: {})",
        options.server.host, options.server.port, options.enable_poller
    );
    let result = run(version.version, options, await_shutdown_signal()).await;
    if let Err(e) = result {
        error!("Failed to run the agent: {e}");
    }
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
