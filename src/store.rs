//! In-memory task registry.
//!
//! [`TaskStore`] is the only owner of [`Task`] records. Every operation takes the
//! registry lock for the in-memory mutation only; callers get clones back and
//! never a reference into the map. No I/O happens while the lock is held.

use crate::error::{Error, Result};
use crate::types::{Outcome, Status, Task, TaskId, URL_QUOTA};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Concurrency-safe registry of task records
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: Mutex<HashMap<TaskId, Task>>,
}

impl TaskStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new task in `Created` state.
    ///
    /// Fails only if the freshly generated id is already taken.
    pub async fn create(&self, name: &str) -> Result<Task> {
        let now = Utc::now();
        let task = Task {
            id: TaskId::new(),
            name: name.to_string(),
            status: Status::Created,
            urls: Vec::with_capacity(URL_QUOTA),
            errors: Vec::new(),
            zip_path: None,
            created_at: now,
            updated_at: now,
        };

        let mut tasks = self.tasks.lock().await;
        if tasks.contains_key(&task.id) {
            return Err(Error::Internal(format!("task id {} already in use", task.id)));
        }
        tasks.insert(task.id, task.clone());
        Ok(task)
    }

    /// Snapshot of one task
    pub async fn get(&self, id: TaskId) -> Result<Task> {
        self.tasks
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Snapshot of every task, oldest first
    pub async fn list(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.lock().await.values().cloned().collect();
        tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        tasks
    }

    /// Append a URL to a task.
    ///
    /// Returns `true` when this append brought the task to exactly [`URL_QUOTA`]
    /// URLs; that is the signal to dispatch the archive pipeline.
    pub async fn add_url(&self, id: TaskId, url: &str) -> Result<bool> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if task.urls.len() >= URL_QUOTA {
            return Err(Error::QuotaExceeded {
                id,
                quota: URL_QUOTA,
            });
        }

        task.urls.push(url.to_string());
        if task.status == Status::Created {
            task.status = Status::InProcess;
        }
        task.updated_at = Utc::now();

        Ok(task.urls.len() == URL_QUOTA)
    }

    /// Record the terminal outcome of a pipeline run.
    ///
    /// A task that is already terminal is left untouched and an error is returned.
    pub async fn finish(&self, id: TaskId, outcome: Outcome) -> Result<Task> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;

        if task.status.is_terminal() {
            return Err(Error::Internal(format!(
                "task {id} already finished as {}",
                task.status
            )));
        }

        task.status = outcome.status();
        match outcome {
            Outcome::Completed { zip_path, errors } => {
                task.zip_path = Some(zip_path);
                task.errors = errors;
            }
            Outcome::Failed { errors } => {
                task.zip_path = None;
                task.errors = errors;
            }
        }
        task.updated_at = Utc::now();

        Ok(task.clone())
    }

    /// Number of registered tasks
    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Whether the store holds no tasks
    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }
}
