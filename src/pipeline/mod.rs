//! Archive pipeline: download a task's URLs into scratch space and pack them.
//!
//! A run never returns an error. Per-URL failures are collected into the
//! task's error list and the remaining files are archived, even when none are
//! left. Only a failure to produce the zip itself fails the task.

mod archive;
mod download;
mod scratch;

pub use archive::{ArchiveEntry, write_zip};
pub use download::{Downloaded, download_to, local_file_name};
pub use scratch::ScratchDir;

use crate::config::{Config, FetchConfig};
use crate::error::Result;
use crate::types::{Outcome, TaskId};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Downloads and packs the URLs of a task
#[derive(Clone, Debug)]
pub struct ArchivePipeline {
    client: reqwest::Client,
    fetch: FetchConfig,
    storage_dir: PathBuf,
    scratch_root: PathBuf,
}

impl ArchivePipeline {
    /// Build a pipeline from the service configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.fetch.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            fetch: config.fetch.clone(),
            storage_dir: config.storage_dir().clone(),
            scratch_root: config.scratch_root(),
        })
    }

    /// Where the archive of task `id` is written
    pub fn zip_path(&self, id: TaskId) -> PathBuf {
        self.storage_dir.join(format!("{id}.zip"))
    }

    /// Scratch directory used while task `id` runs
    pub fn scratch_path(&self, id: TaskId) -> PathBuf {
        self.scratch_root.join(id.to_string())
    }

    /// Run the pipeline for task `id` over `urls` (in acceptance order)
    pub async fn run(&self, id: TaskId, urls: &[String]) -> Outcome {
        let scratch = match ScratchDir::create(&self.scratch_root, &id.to_string()).await {
            Ok(scratch) => scratch,
            Err(e) => {
                warn!(task_id = %id, error = %e, "failed to create scratch directory");
                return Outcome::Failed {
                    errors: vec![format!("failed to create scratch directory: {e}")],
                };
            }
        };

        let (downloaded, mut errors) = self.download_all(scratch.path(), urls).await;
        if downloaded.is_empty() {
            warn!(
                task_id = %id,
                failures = errors.len(),
                "no source could be downloaded, archive will be empty"
            );
        }

        if let Err(e) = tokio::fs::create_dir_all(&self.storage_dir).await {
            errors.push(format!("failed to create storage directory: {e}"));
            scratch.cleanup().await;
            return Outcome::Failed { errors };
        }

        let zip_path = self.zip_path(id);
        let entries = downloaded
            .into_iter()
            .map(|d| ArchiveEntry {
                source: d.path,
                name: d.entry_name,
            })
            .collect::<Vec<_>>();
        let entry_count = entries.len();

        let outcome = match write_zip(&zip_path, entries).await {
            Ok(size) => {
                info!(
                    task_id = %id,
                    zip = %zip_path.display(),
                    entries = entry_count,
                    bytes = size,
                    skipped = errors.len(),
                    "archive written"
                );
                Outcome::Completed { zip_path, errors }
            }
            Err(e) => {
                warn!(task_id = %id, error = %e, "failed to write archive");
                errors.push(format!("failed to write archive: {e}"));
                Outcome::Failed { errors }
            }
        };

        scratch.cleanup().await;
        outcome
    }

    /// Fetch every URL concurrently; results keep URL order
    async fn download_all(&self, dir: &Path, urls: &[String]) -> (Vec<Downloaded>, Vec<String>) {
        let results = join_all(urls.iter().enumerate().map(|(index, url)| {
            let entry_name = local_file_name(index, url);
            let path = dir.join(&entry_name);
            async move {
                download_to(&self.client, url, &path, &self.fetch)
                    .await
                    .map(|size| Downloaded {
                        path,
                        entry_name,
                        size,
                    })
            }
        }))
        .await;

        let mut downloaded = Vec::new();
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(file) => downloaded.push(file),
                Err(e) => {
                    warn!(error = %e, "download failed");
                    errors.push(e.to_string());
                }
            }
        }
        (downloaded, errors)
    }
}
