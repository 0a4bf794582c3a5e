//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the archive-service REST API
///
/// Served at:
/// - `/api/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "archive-service REST API",
        description = "Collect PDF and JPEG source URLs into tasks and pack them into zip archives",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // Tasks
        crate::api::routes::create_task,
        crate::api::routes::list_tasks,
        crate::api::routes::get_task,
        crate::api::routes::add_url,
        crate::api::routes::get_status,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        crate::types::Status,
        crate::types::MediaKind,
        crate::types::TaskView,
        crate::types::StatusView,
        crate::types::Event,

        crate::config::Config,
        crate::config::StorageConfig,
        crate::config::AdmissionConfig,
        crate::config::FetchConfig,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,

        crate::api::routes::CreateTaskRequest,
        crate::api::routes::AddUrlRequest,

        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Archive tasks - Create tasks, attach source URLs and poll status"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec, events"),
    )
)]
pub struct ApiDoc;
