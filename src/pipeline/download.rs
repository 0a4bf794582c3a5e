//! Full downloads of source URLs into the scratch directory.

use crate::config::FetchConfig;
use crate::error::DownloadError;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Longest basename kept from a URL before the index prefix is added
const MAX_BASENAME_LEN: usize = 96;

/// Fallback basename when the URL path has no usable last segment
const FALLBACK_BASENAME: &str = "download";

/// Local (and zip entry) name for the URL at `index` within a task.
///
/// The 1-based index prefix makes names unique even when two URLs share a
/// remote basename; the basename is reduced to a safe character set.
pub fn local_file_name(index: usize, url: &str) -> String {
    let basename = url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .map(|segment| sanitize(&segment))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_BASENAME.to_string());

    format!("{:02}_{}", index + 1, basename)
}

fn sanitize(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    cleaned
        .trim_start_matches('.')
        .chars()
        .take(MAX_BASENAME_LEN)
        .collect()
}

/// Download `url` into `dest`, enforcing the configured time and size bounds.
///
/// Returns the number of bytes written. A partially written file is removed on
/// failure.
pub async fn download_to(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    fetch: &FetchConfig,
) -> Result<u64, DownloadError> {
    let result = match tokio::time::timeout(
        fetch.download_timeout,
        fetch_into(client, url, dest, fetch.max_download_bytes),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(DownloadError::Timeout {
            url: url.to_string(),
            seconds: fetch.download_timeout.as_secs(),
        }),
    };

    if result.is_err() {
        let _ = tokio::fs::remove_file(dest).await;
    }
    result
}

async fn fetch_into(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    limit: u64,
) -> Result<u64, DownloadError> {
    let request_error = |e: reqwest::Error| DownloadError::Request {
        url: url.to_string(),
        reason: e.to_string(),
    };
    let write_error = |source: std::io::Error| DownloadError::Write {
        url: url.to_string(),
        source,
    };
    let too_large = || DownloadError::TooLarge {
        url: url.to_string(),
        limit,
    };

    let mut response = client.get(url).send().await.map_err(request_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    if response.content_length().is_some_and(|len| len > limit) {
        return Err(too_large());
    }

    let mut file = tokio::fs::File::create(dest).await.map_err(write_error)?;
    let mut written: u64 = 0;

    while let Some(chunk) = response.chunk().await.map_err(request_error)? {
        written += chunk.len() as u64;
        if written > limit {
            return Err(too_large());
        }
        file.write_all(&chunk).await.map_err(write_error)?;
    }

    file.flush().await.map_err(write_error)?;
    file.sync_all().await.map_err(write_error)?;

    Ok(written)
}

/// A file that downloaded successfully
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Downloaded {
    /// Path inside the scratch directory
    pub path: PathBuf,
    /// Entry name in the archive
    pub entry_name: String,
    /// Bytes written
    pub size: u64,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn local_names_are_prefixed_with_position() {
        assert_eq!(local_file_name(0, "http://h/docs/report.pdf"), "01_report.pdf");
        assert_eq!(local_file_name(2, "http://h/a/photo.jpg?x=1"), "03_photo.jpg");
    }

    #[test]
    fn shared_basenames_get_distinct_names() {
        let urls = [
            "http://one/photo.jpg",
            "http://two/photo.jpg",
            "http://three/other/photo.jpg",
        ];
        let names: HashSet<String> = urls
            .iter()
            .enumerate()
            .map(|(i, u)| local_file_name(i, u))
            .collect();
        assert_eq!(names.len(), urls.len());
    }

    #[test]
    fn unusable_basenames_fall_back() {
        assert_eq!(local_file_name(0, "http://h/"), "01_download");
        assert_eq!(local_file_name(1, "not a url"), "02_download");
        assert_eq!(local_file_name(0, "http://h/.."), "01_download");
    }

    #[test]
    fn basenames_are_sanitized() {
        assert_eq!(
            local_file_name(0, "http://h/my%20file%2F..%2Fx.pdf"),
            "01_my_20file_2F.._2Fx.pdf"
        );
        assert_eq!(local_file_name(0, "http://h/.hidden"), "01_hidden");
    }

    #[tokio::test]
    async fn download_writes_the_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/a.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 content".to_vec()))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("01_a.pdf");
        let size = download_to(
            &reqwest::Client::new(),
            &format!("{}/a.pdf", server.uri()),
            &dest,
            &FetchConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(size, 16);
        assert_eq!(std::fs::read(&dest).unwrap(), b"%PDF-1.4 content");
    }

    #[tokio::test]
    async fn download_reports_status_and_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone.pdf"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("01_gone.pdf");
        let err = download_to(
            &reqwest::Client::new(),
            &format!("{}/gone.pdf", server.uri()),
            &dest,
            &FetchConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DownloadError::Status { status: 410, .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn download_enforces_size_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/big.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 4096]))
            .mount(&server)
            .await;

        let fetch = FetchConfig {
            max_download_bytes: 1024,
            ..FetchConfig::default()
        };
        let dir = tempdir().unwrap();
        let dest = dir.path().join("01_big.pdf");
        let err = download_to(
            &reqwest::Client::new(),
            &format!("{}/big.pdf", server.uri()),
            &dest,
            &fetch,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DownloadError::TooLarge { limit: 1024, .. }));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn download_enforces_time_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"%PDF".to_vec())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let fetch = FetchConfig {
            download_timeout: Duration::from_secs(1),
            ..FetchConfig::default()
        };
        let dir = tempdir().unwrap();
        let err = download_to(
            &reqwest::Client::new(),
            &format!("{}/slow.pdf", server.uri()),
            &dir.path().join("01_slow.pdf"),
            &fetch,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DownloadError::Timeout { seconds: 1, .. }));
    }
}
