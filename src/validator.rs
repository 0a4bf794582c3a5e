//! Content-type validation for source URLs.
//!
//! Before a URL is attached to a task its first bytes are fetched and sniffed.
//! Only PDF documents and JPEG images are accepted. The full resource is not
//! downloaded here; that happens later in the archive pipeline.

use crate::config::FetchConfig;
use crate::error::{Error, Result};
use crate::types::MediaKind;
use async_trait::async_trait;
use std::time::Duration;

const PDF_MAGIC: &[u8] = b"%PDF-";
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const GIF87_MAGIC: &[u8] = b"GIF87a";
const GIF89_MAGIC: &[u8] = b"GIF89a";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

const HTML_PREFIXES: &[&str] = &["<!doctype html", "<html", "<head", "<body"];

/// Classifies the resource behind a URL before it is accepted into a task.
///
/// The service holds this as a trait object so tests and embedders can swap in
/// their own probe.
#[async_trait]
pub trait ContentValidator: Send + Sync {
    /// Probe `url` and return its media kind if it is accepted.
    ///
    /// # Errors
    ///
    /// - [`Error::Unavailable`] for network failures, timeouts and non-success statuses
    /// - [`Error::UnsupportedContent`] when the detected kind is not accepted
    async fn classify(&self, url: &str) -> Result<MediaKind>;

    /// Name of the implementation, for logs
    fn name(&self) -> &'static str;
}

/// [`ContentValidator`] that reads a bounded prefix over HTTP
#[derive(Clone, Debug)]
pub struct HttpContentValidator {
    client: reqwest::Client,
    probe_bytes: usize,
    timeout: Duration,
}

impl HttpContentValidator {
    /// Build a validator from the fetch settings
    pub fn new(fetch: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(fetch.probe_timeout)
            .user_agent(fetch.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            probe_bytes: fetch.probe_bytes,
            timeout: fetch.probe_timeout,
        })
    }

    async fn read_prefix(&self, url: &str) -> Result<Vec<u8>> {
        let unavailable = |reason: String| Error::Unavailable {
            url: url.to_string(),
            reason,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| unavailable(describe_request_error(&e, self.timeout)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(unavailable(format!("server returned {status}")));
        }

        let mut prefix = Vec::with_capacity(self.probe_bytes);
        while prefix.len() < self.probe_bytes {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    let wanted = self.probe_bytes - prefix.len();
                    prefix.extend_from_slice(&chunk[..chunk.len().min(wanted)]);
                }
                Ok(None) => break,
                Err(e) => return Err(unavailable(describe_request_error(&e, self.timeout))),
            }
        }

        Ok(prefix)
    }
}

#[async_trait]
impl ContentValidator for HttpContentValidator {
    async fn classify(&self, url: &str) -> Result<MediaKind> {
        let prefix = self.read_prefix(url).await?;
        let kind = sniff(&prefix);

        tracing::debug!(url, bytes = prefix.len(), mime = kind.mime(), "probed source");

        if kind.is_accepted() {
            Ok(kind)
        } else {
            Err(Error::UnsupportedContent {
                url: url.to_string(),
                detected: kind.mime().to_string(),
            })
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Detect the media kind from the leading bytes of a resource
pub fn sniff(prefix: &[u8]) -> MediaKind {
    if prefix.starts_with(PDF_MAGIC) {
        return MediaKind::Pdf;
    }
    if prefix.starts_with(JPEG_MAGIC) {
        return MediaKind::Jpeg;
    }
    if prefix.starts_with(PNG_MAGIC) {
        return MediaKind::Png;
    }
    if prefix.starts_with(GIF87_MAGIC) || prefix.starts_with(GIF89_MAGIC) {
        return MediaKind::Gif;
    }
    if prefix.starts_with(ZIP_MAGIC) {
        return MediaKind::Zip;
    }
    if looks_like_html(prefix) {
        return MediaKind::Html;
    }
    if looks_like_text(prefix) {
        return MediaKind::Text;
    }
    MediaKind::Unknown
}

fn looks_like_html(prefix: &[u8]) -> bool {
    let start = prefix
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(prefix.len());
    let head = String::from_utf8_lossy(&prefix[start..prefix.len().min(start + 16)])
        .to_ascii_lowercase();
    HTML_PREFIXES.iter().any(|p| head.starts_with(p))
}

fn looks_like_text(prefix: &[u8]) -> bool {
    if prefix.is_empty() {
        return false;
    }
    // A multi-byte character cut off by the probe limit still counts as text.
    let valid = match std::str::from_utf8(prefix) {
        Ok(s) => s,
        Err(e) if e.error_len().is_none() => {
            match std::str::from_utf8(&prefix[..e.valid_up_to()]) {
                Ok(s) => s,
                Err(_) => return false,
            }
        }
        Err(_) => return false,
    };
    valid
        .chars()
        .all(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
}

fn describe_request_error(e: &reqwest::Error, timeout: Duration) -> String {
    if e.is_timeout() {
        format!("timed out after {}s", timeout.as_secs())
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    }
}
