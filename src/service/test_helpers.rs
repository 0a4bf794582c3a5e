//! Shared test helpers for creating ArchiveService instances in tests.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::service::ArchiveService;
use crate::types::{MediaKind, TaskId, TaskView};
use crate::validator::ContentValidator;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Validator that decides by file extension instead of probing the network.
///
/// `.pdf` and `.jpg` are accepted, `.png` is unsupported and any URL containing
/// `unreachable` is unavailable.
pub(crate) struct ExtensionValidator;

#[async_trait]
impl ContentValidator for ExtensionValidator {
    async fn classify(&self, url: &str) -> Result<MediaKind> {
        if url.contains("unreachable") {
            return Err(Error::Unavailable {
                url: url.to_string(),
                reason: "connection failed".into(),
            });
        }
        if url.ends_with(".pdf") {
            Ok(MediaKind::Pdf)
        } else if url.ends_with(".jpg") {
            Ok(MediaKind::Jpeg)
        } else {
            Err(Error::UnsupportedContent {
                url: url.to_string(),
                detected: MediaKind::Png.mime().to_string(),
            })
        }
    }

    fn name(&self) -> &'static str {
        "extension"
    }
}

/// [`ExtensionValidator`] that takes `delay` before answering for URLs containing `/slow`
pub(crate) struct SlowValidator {
    pub delay: Duration,
}

#[async_trait]
impl ContentValidator for SlowValidator {
    async fn classify(&self, url: &str) -> Result<MediaKind> {
        if url.contains("/slow") {
            tokio::time::sleep(self.delay).await;
        }
        ExtensionValidator.classify(url).await
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

/// Service with storage in a fresh tempdir (which must be kept alive)
pub(crate) async fn create_test_service(max_active: usize) -> (ArchiveService, TempDir) {
    create_test_service_with_validator(max_active, Arc::new(ExtensionValidator)).await
}

/// Same as [`create_test_service`] with a custom validator
pub(crate) async fn create_test_service_with_validator(
    max_active: usize,
    validator: Arc<dyn ContentValidator>,
) -> (ArchiveService, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.storage_dir = temp_dir.path().join("storage");
    config.admission.max_active_tasks = max_active;
    config.fetch.download_timeout = Duration::from_secs(5);

    let service = ArchiveService::with_validator(config, validator)
        .await
        .unwrap();
    (service, temp_dir)
}

/// Poll until the task is terminal, failing the test after a few seconds
pub(crate) async fn wait_for_terminal(service: &ArchiveService, id: TaskId) -> TaskView {
    for _ in 0..200 {
        let task = service.get_task(id).await.unwrap();
        if task.status.is_terminal() {
            return task;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("task {id} did not reach a terminal status");
}

/// Poll until no task holds an admission slot
pub(crate) async fn wait_for_idle(service: &ArchiveService) {
    for _ in 0..200 {
        if service.active_tasks().await == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("admission slots were not released");
}

