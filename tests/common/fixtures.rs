//! Source server and service fixtures

use archive_service::{ArchiveService, Config, TaskId, TaskView};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Minimal PDF header followed by filler
pub const PDF_BODY: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n1 0 obj\n<<>>\nendobj\n";

/// JPEG SOI + APP0 marker followed by filler
pub const JPEG_BODY: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01,
];

/// PNG signature
pub const PNG_BODY: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

/// Mock HTTP server standing in for the document sources
pub struct SourceServer {
    pub server: MockServer,
}

impl SourceServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Serve `body` with status 200 at `route`
    pub async fn serve(&self, route: &str, body: &[u8]) {
        self.respond(route, ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .await;
    }

    /// Serve `body` for the first `probes` requests, then fail with `status`
    pub async fn serve_then_fail(&self, route: &str, body: &[u8], probes: u64, status: u16) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .up_to_n_times(probes)
            .with_priority(1)
            .mount(&self.server)
            .await;
        self.respond(route, ResponseTemplate::new(status)).await;
    }

    pub async fn respond(&self, route: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }

    pub fn url(&self, route: &str) -> String {
        format!("{}{}", self.server.uri(), route)
    }
}

/// Real service (HTTP probe included) storing into a fresh tempdir
pub async fn create_service(max_active: usize) -> (ArchiveService, TempDir) {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let mut config = Config::default();
    config.storage.storage_dir = temp_dir.path().join("storage");
    config.admission.max_active_tasks = max_active;
    config.fetch.probe_timeout = Duration::from_secs(2);
    config.fetch.download_timeout = Duration::from_secs(5);

    let service = ArchiveService::new(config).await.expect("service");
    (service, temp_dir)
}

/// Poll until the task is terminal
pub async fn wait_for_terminal(service: &ArchiveService, id: TaskId) -> TaskView {
    for _ in 0..400 {
        let task = service.get_task(id).await.expect("task exists");
        if task.status.is_terminal() {
            return task;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("task {id} did not reach a terminal status");
}

/// Poll until every admission slot is free
pub async fn wait_for_idle(service: &ArchiveService) {
    for _ in 0..400 {
        if service.active_tasks().await == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("admission slots were not released");
}
