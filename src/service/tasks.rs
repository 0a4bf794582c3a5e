//! Task creation, URL intake and read-side queries.

use crate::error::{Error, Result};
use crate::types::{Event, StatusView, TaskId, TaskView, URL_QUOTA, UrlAccepted};
use std::sync::atomic::Ordering;

use super::ArchiveService;

impl ArchiveService {
    /// Create a task, taking one admission slot.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] for an empty name
    /// - [`Error::Busy`] when the configured number of active tasks is reached
    /// - [`Error::ShuttingDown`] after [`shutdown`](Self::shutdown) started
    pub async fn create_task(&self, name: &str) -> Result<TaskView> {
        self.ensure_accepting()?;

        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidRequest("task name must not be empty".into()));
        }

        if !self.admission.try_acquire().await {
            tracing::info!(
                max_active = self.admission.max_active(),
                "Rejected task creation, server busy"
            );
            return Err(Error::Busy {
                max_active: self.admission.max_active(),
            });
        }

        let task = match self.store.create(name).await {
            Ok(task) => task,
            Err(e) => {
                self.admission.release().await;
                return Err(e);
            }
        };

        tracing::info!(task_id = %task.id, name = %task.name, "Task created");
        self.emit_event(Event::TaskCreated {
            id: task.id,
            name: task.name.clone(),
        });

        Ok(task.into())
    }

    /// Attach a URL to a task after probing its content type.
    ///
    /// The call that fills the task to its quota dispatches the archive
    /// pipeline and reports `archive_started`. The call holds a worker token
    /// throughout, so [`shutdown`](Self::shutdown) waits for it.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidRequest`] for a URL that is not absolute http(s)
    /// - [`Error::NotFound`] for an unknown task
    /// - [`Error::QuotaExceeded`] when the task already holds its quota
    /// - [`Error::UnsupportedContent`] / [`Error::Unavailable`] from the probe
    /// - [`Error::ShuttingDown`] after [`shutdown`](Self::shutdown) started
    pub async fn add_url(&self, id: TaskId, url: &str) -> Result<UrlAccepted> {
        let _intake = self.workers.token();
        self.ensure_accepting()?;
        let url = parse_source_url(url)?;

        // Reject full or unknown tasks before spending a network round trip
        let task = self.store.get(id).await?;
        if task.remaining_urls() == 0 {
            return Err(Error::QuotaExceeded {
                id,
                quota: URL_QUOTA,
            });
        }

        let kind = match self.validator.classify(&url).await {
            Ok(kind) => kind,
            Err(e) => {
                tracing::info!(task_id = %id, url = %url, error = %e, "URL rejected");
                return Err(e);
            }
        };

        // Shutdown may have started while the probe was in flight
        if let Err(e) = self.ensure_accepting() {
            tracing::info!(task_id = %id, url = %url, "URL dropped, shutting down");
            return Err(e);
        }

        let reached = self.store.add_url(id, &url).await?;
        let task = self.store.get(id).await?;
        let url_count = task.urls.len();

        tracing::info!(task_id = %id, url = %url, mime = kind.mime(), url_count, "URL accepted");
        self.emit_event(Event::UrlAccepted {
            id,
            url,
            url_count,
        });

        if reached {
            self.dispatch(id, task.urls);
        }

        Ok(UrlAccepted {
            url_count,
            archive_started: reached,
        })
    }

    /// Externally visible status of a task
    pub async fn get_status(&self, id: TaskId) -> Result<StatusView> {
        let task = self.store.get(id).await?;
        Ok(StatusView::from(&task))
    }

    /// Full view of a task
    pub async fn get_task(&self, id: TaskId) -> Result<TaskView> {
        Ok(self.store.get(id).await?.into())
    }

    /// Every task, oldest first
    pub async fn list_tasks(&self) -> Vec<TaskView> {
        self.store
            .list()
            .await
            .into_iter()
            .map(TaskView::from)
            .collect()
    }

    fn ensure_accepting(&self) -> Result<()> {
        if self.accepting_new.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(Error::ShuttingDown)
        }
    }
}

/// Accept only absolute http(s) URLs with a host
fn parse_source_url(raw: &str) -> Result<String> {
    let raw = raw.trim();
    let parsed = url::Url::parse(raw)
        .map_err(|e| Error::InvalidRequest(format!("invalid url '{raw}': {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(Error::InvalidRequest(format!(
            "unsupported url '{raw}': only http and https are allowed"
        )));
    }

    Ok(raw.to_string())
}
