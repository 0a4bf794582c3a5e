//! Service facade split into focused submodules.
//!
//! The `ArchiveService` struct and its methods are organized by concern:
//! - [`tasks`] - Task creation, URL intake and read-side queries
//! - [`dispatch`] - Running the archive pipeline once a task is full
//! - [`lifecycle`] - Shutdown coordination

mod dispatch;
mod lifecycle;
mod tasks;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use crate::admission::AdmissionController;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::pipeline::ArchivePipeline;
use crate::store::TaskStore;
use crate::types::Event;
use crate::validator::{ContentValidator, HttpContentValidator};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio_util::task::TaskTracker;

/// Buffer of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main service instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct ArchiveService {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Task registry
    pub(crate) store: Arc<TaskStore>,
    /// Bound on non-terminal tasks
    pub(crate) admission: Arc<AdmissionController>,
    /// Probe run before a URL is accepted (trait object for pluggable implementations)
    pub(crate) validator: Arc<dyn ContentValidator>,
    /// Download and zip step
    pub(crate) pipeline: Arc<ArchivePipeline>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// In-flight pipeline runs and URL intake, drained at shutdown
    pub(crate) workers: TaskTracker,
    /// Flag to indicate whether new work is accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

impl ArchiveService {
    /// Create a new ArchiveService probing URLs over HTTP
    ///
    /// Validates the configuration and creates the storage and scratch
    /// directories.
    pub async fn new(config: Config) -> Result<Self> {
        let validator = HttpContentValidator::new(&config.fetch)?;
        Self::with_validator(config, Arc::new(validator)).await
    }

    /// Create a new ArchiveService with a custom [`ContentValidator`]
    pub async fn with_validator(
        config: Config,
        validator: Arc<dyn ContentValidator>,
    ) -> Result<Self> {
        config.validate()?;

        for dir in [config.storage_dir().clone(), config.scratch_root()] {
            tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create directory '{}': {}", dir.display(), e),
                ))
            })?;
        }

        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let pipeline = ArchivePipeline::new(&config)?;

        tracing::info!(
            storage_dir = %config.storage_dir().display(),
            max_active_tasks = config.admission.max_active_tasks,
            validator = validator.name(),
            "Archive service initialized"
        );

        Ok(Self {
            admission: Arc::new(AdmissionController::new(config.admission.max_active_tasks)),
            config: Arc::new(config),
            store: Arc::new(TaskStore::new()),
            validator,
            pipeline: Arc::new(pipeline),
            event_tx,
            workers: TaskTracker::new(),
            accepting_new: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Subscribe to task events
    ///
    /// Each subscriber receives all events independently. A subscriber that
    /// falls more than 1000 events behind gets `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Number of tasks currently holding an admission slot
    pub async fn active_tasks(&self) -> usize {
        self.admission.active().await
    }

    /// Emit an event to all subscribers
    ///
    /// With no subscribers the event is dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Spawn the REST API server in a background task
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let service = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(service, config).await })
    }
}
