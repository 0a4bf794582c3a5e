//! Assertions over produced archives and task views

use archive_service::{Status, TaskView};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Entry names in the archive, sorted
pub fn zip_entry_names(zip_path: &Path) -> Vec<String> {
    let file = std::fs::File::open(zip_path).expect("open zip");
    let archive = zip::ZipArchive::new(file).expect("read zip");
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    names
}

/// Contents of one archive entry
pub fn zip_entry(zip_path: &Path, name: &str) -> Vec<u8> {
    let file = std::fs::File::open(zip_path).expect("open zip");
    let mut archive = zip::ZipArchive::new(file).expect("read zip");
    let mut entry = archive.by_name(name).expect("entry present");
    let mut body = Vec::new();
    entry.read_to_end(&mut body).expect("read entry");
    body
}

/// `zip_path` is present exactly when the task completed
pub fn assert_zip_path_matches_status(task: &TaskView) {
    assert_eq!(
        task.zip_path.is_some(),
        task.status == Status::Completed,
        "zip_path/status mismatch for {task:?}"
    );
}

/// Archive path of a completed task
pub fn completed_zip(task: &TaskView) -> PathBuf {
    assert_eq!(task.status, Status::Completed, "task not completed: {task:?}");
    PathBuf::from(task.zip_path.as_deref().expect("completed task has zip_path"))
}

/// The task's scratch directory has been removed
pub fn assert_scratch_removed(storage_dir: &Path, task: &TaskView) {
    let scratch = storage_dir.join("tmp").join(task.id.to_string());
    assert!(!scratch.exists(), "scratch dir {} left behind", scratch.display());
}
