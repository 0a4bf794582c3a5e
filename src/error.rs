//! Error types for archive-service
//!
//! This module provides:
//! - The task-level error taxonomy surfaced by [`ArchiveService`](crate::ArchiveService)
//! - Per-URL download errors that the pipeline records instead of propagating
//! - HTTP status code mapping and the JSON error body used by the REST API

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::TaskId;

/// Result type alias for archive-service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for archive-service
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_active_tasks")
        key: Option<String>,
    },

    /// Unknown task id (or a string that is not a task id at all)
    #[error("task {0} not found")]
    NotFound(String),

    /// Admission denied: the configured number of active tasks is reached
    #[error("server is busy (max {max_active} active tasks allowed)")]
    Busy {
        /// Configured maximum of simultaneously active tasks
        max_active: usize,
    },

    /// The task already holds its full quota of URLs
    #[error("task {id} already has {quota} urls")]
    QuotaExceeded {
        /// The task that is full
        id: TaskId,
        /// URL quota per task
        quota: usize,
    },

    /// The resource behind a URL is not an accepted media type
    #[error("unsupported content at {url}: detected {detected}")]
    UnsupportedContent {
        /// The URL that was probed
        url: String,
        /// MIME type detected from the leading bytes
        detected: String,
    },

    /// The resource could not be reached or read
    #[error("url unavailable: {url}: {reason}")]
    Unavailable {
        /// The URL that was probed
        url: String,
        /// What went wrong (status code, timeout, connection error)
        reason: String,
    },

    /// Malformed request input (empty name, bad URL)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Shutdown in progress - not accepting new work
    #[error("shutdown in progress: not accepting new tasks")]
    ShuttingDown,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client error outside of a probe or download
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Zip writer error
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Unexpected internal failure
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure of a single source download inside the archive pipeline.
///
/// These never fail a task on their own. Their `Display` output is what ends up
/// in the task's `errors` list.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Request could not be sent or the body could not be read
    #[error("{url}: request failed: {reason}")]
    Request {
        /// Source URL
        url: String,
        /// Underlying client error
        reason: String,
    },

    /// Server answered with a non-success status
    #[error("{url}: server returned {status}")]
    Status {
        /// Source URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Body exceeded the configured size bound
    #[error("{url}: body exceeds {limit} bytes")]
    TooLarge {
        /// Source URL
        url: String,
        /// Configured limit in bytes
        limit: u64,
    },

    /// Download did not finish within the configured bound
    #[error("{url}: download timed out after {seconds}s")]
    Timeout {
        /// Source URL
        url: String,
        /// Configured timeout in seconds
        seconds: u64,
    },

    /// Local file could not be created or written
    #[error("{url}: failed to save content: {source}")]
    Write {
        /// Source URL
        url: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "quota_exceeded",
///     "message": "task 5f0c... already has 3 urls",
///     "details": { "task_id": "5f0c...", "quota": 3 }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "busy")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Config { .. } => 400,
            Error::InvalidRequest(_) => 400,

            Error::NotFound(_) => 404,

            // 415 Unsupported Media Type
            Error::UnsupportedContent { .. } => 415,

            // 422 Unprocessable Entity
            Error::QuotaExceeded { .. } => 422,
            Error::Unavailable { .. } => 422,

            // 429 Too Many Requests
            Error::Busy { .. } => 429,

            // 500 Internal Server Error
            Error::Io(_) => 500,
            Error::Archive(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Internal(_) => 500,

            // 502 Bad Gateway
            Error::Network(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::NotFound(_) => "not_found",
            Error::Busy { .. } => "busy",
            Error::QuotaExceeded { .. } => "quota_exceeded",
            Error::UnsupportedContent { .. } => "unsupported_content",
            Error::Unavailable { .. } => "unavailable",
            Error::InvalidRequest(_) => "invalid_request",
            Error::ShuttingDown => "shutting_down",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Archive(_) => "archive_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Internal(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Busy { max_active } => Some(serde_json::json!({
                "max_active_tasks": max_active,
            })),
            Error::QuotaExceeded { id, quota } => Some(serde_json::json!({
                "task_id": id.to_string(),
                "quota": quota,
            })),
            Error::UnsupportedContent { url, detected } => Some(serde_json::json!({
                "url": url,
                "detected": detected,
            })),
            Error::Unavailable { url, .. } => Some(serde_json::json!({
                "url": url,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        let mut api_error = ApiError::new(code, message);
        api_error.error.details = details;
        api_error
    }
}
