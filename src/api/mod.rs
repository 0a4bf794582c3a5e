//! REST API server module
//!
//! Exposes task creation, URL intake and status polling over HTTP, plus
//! health, OpenAPI and a server-sent events stream.

use crate::{ArchiveService, Config, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Tasks
/// - `POST /api/tasks` - Create a task
/// - `GET /api/tasks` - List all tasks
/// - `GET /api/tasks/:id` - Get a single task
/// - `POST /api/tasks/:id/urls` - Attach a source URL
/// - `GET /api/tasks/:id/status` - Get task status
///
/// ## System
/// - `GET /api/health` - Health check
/// - `GET /api/openapi.json` - OpenAPI specification
/// - `GET /api/events` - Server-sent events stream
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(service: Arc<ArchiveService>, config: Arc<Config>) -> Router {
    let state = AppState::new(service, config.clone());

    let api = Router::new()
        // Tasks
        .route("/tasks", post(routes::create_task).get(routes::list_tasks))
        .route("/tasks/:id", get(routes::get_task))
        .route("/tasks/:id/urls", post(routes::add_url))
        .route("/tasks/:id/status", get(routes::get_status))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream));

    let router = Router::new().nest("/api", api);

    // Swagger UI serves its own copy of the document so it does not clash with /api/openapi.json
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state).layer(TraceLayer::new_for_http());

    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins ("*" allows any origin)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until the listener fails or the surrounding task is aborted.
///
/// # Example
///
/// ```no_run
/// use archive_service::{ArchiveService, Config};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let service = Arc::new(ArchiveService::new((*config).clone()).await?);
///
/// archive_service::api::start_api_server(service, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(service: Arc<ArchiveService>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(service, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
