//! Application state for the API server

use crate::{ArchiveService, Config};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The archive service instance
    pub service: Arc<ArchiveService>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service: Arc<ArchiveService>, config: Arc<Config>) -> Self {
        Self { service, config }
    }
}
