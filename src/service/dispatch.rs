//! Running the archive pipeline once a task is full.

use crate::types::{Event, Outcome, TaskId};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;

use super::ArchiveService;

impl ArchiveService {
    /// Start the pipeline for `id` on the worker tracker.
    ///
    /// Whatever happens inside the run, the task is finished exactly once and
    /// its admission slot is released exactly once.
    pub(crate) fn dispatch(&self, id: TaskId, urls: Vec<String>) {
        tracing::info!(task_id = %id, urls = urls.len(), "Dispatching archive pipeline");
        self.emit_event(Event::ArchiveStarted { id });

        let service = self.clone();
        self.workers.spawn(async move {
            let outcome = match AssertUnwindSafe(service.pipeline.run(id, &urls))
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::error!(task_id = %id, "Archive pipeline panicked");
                    Outcome::Failed {
                        errors: vec!["archive pipeline panicked".to_string()],
                    }
                }
            };

            service.complete(id, outcome).await;
        });
    }

    async fn complete(&self, id: TaskId, outcome: Outcome) {
        match self.store.finish(id, outcome).await {
            Ok(task) => match task.zip_path {
                Some(zip_path) => {
                    tracing::info!(
                        task_id = %id,
                        zip = %zip_path.display(),
                        skipped = task.errors.len(),
                        "Task completed"
                    );
                    self.emit_event(Event::TaskCompleted {
                        id,
                        zip_path,
                        errors: task.errors,
                    });
                }
                None => {
                    tracing::error!(task_id = %id, errors = ?task.errors, "Task failed");
                    self.emit_event(Event::TaskFailed {
                        id,
                        errors: task.errors,
                    });
                }
            },
            Err(e) => {
                tracing::error!(task_id = %id, error = %e, "Failed to record pipeline outcome");
            }
        }

        self.admission.release().await;
    }
}
