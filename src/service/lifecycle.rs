//! Shutdown coordination.

use crate::error::Result;
use crate::types::Event;
use std::time::Duration;

use super::ArchiveService;

impl ArchiveService {
    /// Gracefully shut down the service
    ///
    /// 1. Stops accepting new tasks and URLs
    /// 2. Waits for in-flight URL intake and pipeline runs, at most `timeout`
    /// 3. Emits [`Event::Shutdown`]
    ///
    /// Pipeline runs still going after the timeout keep running on the
    /// runtime; they are not cancelled.
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new
            .store(false, std::sync::atomic::Ordering::SeqCst);
        tracing::info!("Stopped accepting new tasks");

        self.workers.close();
        let in_flight = self.workers.len();
        if in_flight > 0 {
            tracing::info!(in_flight, "Waiting for archive pipelines to finish");
        }

        match tokio::time::timeout(timeout, self.workers.wait()).await {
            Ok(()) => tracing::info!("All archive pipelines finished"),
            Err(_) => tracing::warn!(
                remaining = self.workers.len(),
                "Timeout waiting for archive pipelines, proceeding with shutdown"
            ),
        }

        self.emit_event(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether new tasks and URLs are still accepted
    pub fn is_accepting(&self) -> bool {
        self.accepting_new
            .load(std::sync::atomic::Ordering::SeqCst)
    }
}
