//! Zip packing of downloaded files.

use crate::error::{Error, Result};
use chrono::{DateTime, Datelike, Local, Timelike};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// One file to place in the archive
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// File on disk
    pub source: PathBuf,
    /// Name inside the zip
    pub name: String,
}

/// Write `entries` into a deflated zip at `zip_path`.
///
/// The archive is first written next to its destination with a `.part` suffix
/// and renamed into place once complete, so a reader never sees a half-written
/// file at `zip_path`. Runs on a blocking thread.
pub async fn write_zip(zip_path: &Path, entries: Vec<ArchiveEntry>) -> Result<u64> {
    let zip_path = zip_path.to_path_buf();
    tokio::task::spawn_blocking(move || write_zip_blocking(&zip_path, &entries))
        .await
        .map_err(|e| Error::Internal(format!("zip writer task failed: {e}")))?
}

fn write_zip_blocking(zip_path: &Path, entries: &[ArchiveEntry]) -> Result<u64> {
    let part_path = part_path(zip_path);

    let result = pack(&part_path, entries).and_then(|size| {
        std::fs::rename(&part_path, zip_path)?;
        Ok(size)
    });

    if result.is_err() {
        let _ = std::fs::remove_file(&part_path);
    }
    result
}

fn pack(part_path: &Path, entries: &[ArchiveEntry]) -> Result<u64> {
    let file = File::create(part_path)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));

    for entry in entries {
        let mut source = File::open(&entry.source)?;
        let metadata = source.metadata()?;

        writer.start_file(entry.name.as_str(), entry_options(&metadata))?;
        let copied = std::io::copy(&mut source, &mut writer)?;
        debug!(entry = %entry.name, bytes = copied, "added archive entry");
    }

    let mut inner = writer.finish()?;
    inner.flush()?;
    let file = inner
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    file.sync_all()?;

    Ok(file.metadata()?.len())
}

fn entry_options(metadata: &std::fs::Metadata) -> FileOptions {
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(modified_time(metadata));

    #[cfg(unix)]
    let options = {
        use std::os::unix::fs::PermissionsExt;
        options.unix_permissions(metadata.permissions().mode() & 0o777)
    };

    options
}

fn modified_time(metadata: &std::fs::Metadata) -> zip::DateTime {
    let Ok(modified) = metadata.modified() else {
        return zip::DateTime::default();
    };
    let local: DateTime<Local> = modified.into();

    // Zip timestamps cannot express years before 1980
    zip::DateTime::from_date_and_time(
        u16::try_from(local.year()).unwrap_or(1980),
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second().min(59) as u8,
    )
    .unwrap_or_default()
}

fn part_path(zip_path: &Path) -> PathBuf {
    let mut name = zip_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    zip_path.with_file_name(name)
}
