//! Core types for archive-service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;
use uuid::Uuid;

/// Number of accepted URLs that triggers the archive pipeline
pub const URL_QUOTA: usize = 3;

/// Unique identifier for a task
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Allocate a fresh random id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Task lifecycle status
///
/// `Created → InProcess → Completed | Failed`. The last two are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Status {
    /// No URL accepted yet
    #[serde(rename = "created")]
    Created,
    /// At least one URL accepted; archive pending or being built
    #[serde(rename = "in process")]
    InProcess,
    /// Archive written
    #[serde(rename = "completed")]
    Completed,
    /// Archive could not be produced
    #[serde(rename = "failed")]
    Failed,
}

impl Status {
    /// External representation of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Created => "created",
            Status::InProcess => "in process",
            Status::Completed => "completed",
            Status::Failed => "failed",
        }
    }

    /// Whether no further transition can leave this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Failed)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task record, owned by the [`TaskStore`](crate::store::TaskStore).
///
/// Callers only ever see clones of it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Task {
    /// Immutable id assigned at creation
    pub id: TaskId,
    /// Caller-supplied label
    pub name: String,
    /// Lifecycle status
    pub status: Status,
    /// Accepted URLs in arrival order (never more than [`URL_QUOTA`])
    pub urls: Vec<String>,
    /// Per-URL failures collected by the pipeline
    pub errors: Vec<String>,
    /// Archive location, set only when `status == Completed`
    pub zip_path: Option<PathBuf>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Time of the last mutation
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Number of URLs that can still be attached
    pub fn remaining_urls(&self) -> usize {
        URL_QUOTA.saturating_sub(self.urls.len())
    }
}

/// Terminal result of a pipeline run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Archive written; `errors` lists the URLs that could not be included
    Completed {
        /// Path of the written archive
        zip_path: PathBuf,
        /// Per-URL download failures
        errors: Vec<String>,
    },
    /// No archive produced
    Failed {
        /// Every failure collected during the run
        errors: Vec<String>,
    },
}

impl Outcome {
    /// Status the task takes on when this outcome is recorded
    pub fn status(&self) -> Status {
        match self {
            Outcome::Completed { .. } => Status::Completed,
            Outcome::Failed { .. } => Status::Failed,
        }
    }
}

/// Media type recognized from the first bytes of a resource
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// PDF document
    Pdf,
    /// JPEG image
    Jpeg,
    /// PNG image
    Png,
    /// GIF image
    Gif,
    /// Zip container
    Zip,
    /// HTML page
    Html,
    /// Printable text
    Text,
    /// Anything else
    Unknown,
}

impl MediaKind {
    /// MIME type for this kind
    pub fn mime(&self) -> &'static str {
        match self {
            MediaKind::Pdf => "application/pdf",
            MediaKind::Jpeg => "image/jpeg",
            MediaKind::Png => "image/png",
            MediaKind::Gif => "image/gif",
            MediaKind::Zip => "application/zip",
            MediaKind::Html => "text/html",
            MediaKind::Text => "text/plain",
            MediaKind::Unknown => "application/octet-stream",
        }
    }

    /// Only PDF documents and JPEG images may be attached to a task
    pub fn is_accepted(&self) -> bool {
        matches!(self, MediaKind::Pdf | MediaKind::Jpeg)
    }
}

/// Externally visible view of a task
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TaskView {
    /// Task ID
    #[schema(value_type = String)]
    pub id: TaskId,
    /// Task name
    pub name: String,
    /// Status string ("created", "in process", "completed", "failed")
    pub status: Status,
    /// Accepted URLs in arrival order
    pub urls: Vec<String>,
    /// Per-URL failures
    pub errors: Vec<String>,
    /// Archive path, present only for completed tasks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_path: Option<String>,
    /// When the task was created (RFC 3339)
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    /// When the task last changed (RFC 3339)
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskView {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            name: task.name,
            status: task.status,
            urls: task.urls,
            errors: task.errors,
            zip_path: task.zip_path.map(|p| p.display().to_string()),
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Status-only view returned by the status endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusView {
    /// Status string
    pub status: Status,
}

impl From<&Task> for StatusView {
    fn from(task: &Task) -> Self {
        Self {
            status: task.status,
        }
    }
}

/// Result of an accepted `add_url` call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UrlAccepted {
    /// Number of URLs the task holds after this call
    pub url_count: usize,
    /// Whether this call filled the quota and started the archive pipeline
    pub archive_started: bool,
}

/// Event emitted during the task lifecycle
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Task created
    TaskCreated {
        /// Task ID
        #[schema(value_type = String)]
        id: TaskId,
        /// Task name
        name: String,
    },

    /// URL passed validation and was attached
    UrlAccepted {
        /// Task ID
        #[schema(value_type = String)]
        id: TaskId,
        /// The accepted URL
        url: String,
        /// URLs held after this one
        url_count: usize,
    },

    /// Quota reached, pipeline dispatched
    ArchiveStarted {
        /// Task ID
        #[schema(value_type = String)]
        id: TaskId,
    },

    /// Archive written
    TaskCompleted {
        /// Task ID
        #[schema(value_type = String)]
        id: TaskId,
        /// Archive path
        #[schema(value_type = String)]
        zip_path: PathBuf,
        /// Per-URL failures that were skipped
        errors: Vec<String>,
    },

    /// Pipeline ended without an archive
    TaskFailed {
        /// Task ID
        #[schema(value_type = String)]
        id: TaskId,
        /// Collected failures
        errors: Vec<String>,
    },

    /// Service is shutting down
    Shutdown,
}
