//! archive-service entry point.
//!
//! Startup order:
//! 1. Initialise tracing (`RUST_LOG`, then `ARCHIVE_LOG`, then `info`).
//! 2. Read configuration from `ARCHIVE_*` environment variables.
//! 3. Build the service and start the HTTP API in a background task.
//! 4. Wait for SIGTERM/SIGINT, drain in-flight archive runs, stop the server.

use archive_service::{ArchiveService, Config, run_with_shutdown};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::from_env();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        storage_dir = %config.storage_dir().display(),
        bind = %config.server.api.bind_address,
        "archive-service starting"
    );

    let service = Arc::new(ArchiveService::new(config).await?);
    let mut server = service.spawn_api_server();

    let result: Result<(), Box<dyn std::error::Error>> = tokio::select! {
        shutdown = run_with_shutdown((*service).clone()) => shutdown.map_err(Into::into),
        joined = &mut server => match joined {
            Ok(Ok(())) => {
                info!("API server exited");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "API server failed");
                Err(e.into())
            }
            Err(e) => {
                error!(error = %e, "API server task panicked");
                Err(e.into())
            }
        },
    };
    server.abort();
    result?;

    info!("archive-service stopped");
    Ok(())
}

fn init_tracing() {
    let fallback = std::env::var("ARCHIVE_LOG").unwrap_or_else(|_| "info".to_string());

    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => match fallback.parse::<tracing_subscriber::EnvFilter>() {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARN: ARCHIVE_LOG='{fallback}' is not a valid tracing filter ({e}); \
                     falling back to 'info'"
                );
                tracing_subscriber::EnvFilter::new("info")
            }
        },
    };

    let log_json = std::env::var("ARCHIVE_LOG_JSON")
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    if log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
