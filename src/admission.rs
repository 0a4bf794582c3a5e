//! Admission control for task creation.
//!
//! A task holds one slot from creation until it reaches a terminal state,
//! whichever terminal state that is.

use tokio::sync::Mutex;

/// Bounds the number of simultaneously non-terminal tasks
#[derive(Debug)]
pub struct AdmissionController {
    active: Mutex<usize>,
    max_active: usize,
}

impl AdmissionController {
    /// Create a controller admitting at most `max_active` tasks at once
    pub fn new(max_active: usize) -> Self {
        Self {
            active: Mutex::new(0),
            max_active,
        }
    }

    /// Take a slot if one is free
    pub async fn try_acquire(&self) -> bool {
        let mut active = self.active.lock().await;
        if *active >= self.max_active {
            tracing::debug!(active = *active, max = self.max_active, "admission denied");
            return false;
        }
        *active += 1;
        true
    }

    /// Give a slot back
    pub async fn release(&self) {
        let mut active = self.active.lock().await;
        if *active == 0 {
            tracing::warn!("admission release without a matching acquire");
            return;
        }
        *active -= 1;
    }

    /// Slots currently held
    pub async fn active(&self) -> usize {
        *self.active.lock().await
    }

    /// Configured maximum
    pub fn max_active(&self) -> usize {
        self.max_active
    }
}
