//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`tasks`] - Task creation, URL intake and status
//! - [`system`] - Health, events, OpenAPI

use serde::{Deserialize, Serialize};

mod system;
mod tasks;

pub use system::*;
pub use tasks::*;

// ============================================================================
// Request Types
// ============================================================================

/// Request body for POST /tasks
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    /// Human-readable label for the task
    pub name: String,
}

/// Request body for POST /tasks/:id/urls
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AddUrlRequest {
    /// Absolute http(s) URL of a PDF document or JPEG image
    pub url: String,
}
