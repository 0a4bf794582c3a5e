//! # archive-service
//!
//! Collects source URLs into tasks and packs the fetched documents into zip
//! archives.
//!
//! A task accepts up to three URLs. Each URL is probed before it is attached and
//! only PDF documents and JPEG images are accepted. The URL that fills a task
//! starts a background run that downloads every source and writes
//! `{storage_dir}/{task_id}.zip`. Sources that fail to download are recorded in
//! the task's error list and left out of the archive.
//!
//! ## Quick Start
//!
//! ```no_run
//! use archive_service::{ArchiveService, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = ArchiveService::new(Config::default()).await?;
//!
//!     let mut events = service.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let task = service.create_task("report").await?;
//!     service.add_url(task.id, "https://example.com/report.pdf").await?;
//!     println!("status: {}", service.get_status(task.id).await?.status);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Admission control for task creation
pub mod admission;
/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Download and zip pipeline
pub mod pipeline;
/// Service facade (decomposed into focused submodules)
pub mod service;
/// In-memory task registry
pub mod store;
/// Core types and events
pub mod types;
/// Content-type probing of source URLs
pub mod validator;

// Re-export commonly used types
pub use admission::AdmissionController;
pub use config::Config;
pub use error::{ApiError, DownloadError, Error, ErrorDetail, Result, ToHttpStatus};
pub use pipeline::ArchivePipeline;
pub use service::ArchiveService;
pub use store::TaskStore;
pub use types::{
    Event, MediaKind, Outcome, Status, StatusView, Task, TaskId, TaskView, URL_QUOTA, UrlAccepted,
};
pub use validator::{ContentValidator, HttpContentValidator};

/// How long [`run_with_shutdown`] waits for in-flight archive runs
pub const DEFAULT_SHUTDOWN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Helper function to run the service with graceful signal handling.
///
/// Waits for a termination signal and then calls the service's `shutdown()`
/// method with [`DEFAULT_SHUTDOWN_TIMEOUT`].
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use archive_service::{ArchiveService, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let service = ArchiveService::new(Config::default()).await?;
///     run_with_shutdown(service).await?;
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(service: ArchiveService) -> Result<()> {
    wait_for_signal().await;
    service.shutdown(DEFAULT_SHUTDOWN_TIMEOUT).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
