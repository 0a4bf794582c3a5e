use super::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use std::time::Duration;
use tower::ServiceExt;


/// Helper to create a test ArchiveService instance wrapped in Arc
async fn create_test_service(max_active: usize) -> (Arc<ArchiveService>, tempfile::TempDir) {
    let (service, temp_dir) =
        crate::service::test_helpers::create_test_service(max_active).await;
    (Arc::new(service), temp_dir)
}

/// Router over a fresh service with the given admission bound
async fn test_app(max_active: usize) -> (Router, Arc<ArchiveService>, tempfile::TempDir) {
    let (service, temp_dir) = create_test_service(max_active).await;
    let app = create_router(service.clone(), service.get_config());
    (app, service, temp_dir)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (service, _temp_dir) = create_test_service(3).await;

    let mut config = (*service.get_config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let service = service.clone();
        let config = config.clone();
        async move { start_api_server(service, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server should still be running");
    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let (service, _temp_dir) = create_test_service(3).await;

    let mut config = (*service.get_config()).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let app = create_router(service, Arc::new(config));

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (service, _temp_dir) = create_test_service(3).await;

    let mut config = (*service.get_config()).clone();
    config.server.api.cors_enabled = false;
    let app = create_router(service, Arc::new(config));

    let request = Request::builder()
        .uri("/api/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_swagger_ui_can_be_disabled() {
    let (service, _temp_dir) = create_test_service(3).await;

    let enabled = create_router(service.clone(), service.get_config());
    let response = enabled.oneshot(get("/api-docs/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut config = (*service.get_config()).clone();
    config.server.api.swagger_ui = false;
    let disabled = create_router(service, Arc::new(config));
    let response = disabled.oneshot(get("/api-docs/openapi.json")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_spawn_api_server_method() {
    let (service, _temp_dir) = create_test_service(3).await;

    let mut config = (*service.get_config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let service = Arc::new(
        ArchiveService::with_validator(
            config,
            Arc::new(crate::service::test_helpers::ExtensionValidator),
        )
        .await
        .unwrap(),
    );

    let api_handle = service.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(100)).await;
    api_handle.abort();
}
