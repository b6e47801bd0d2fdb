//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the archive-dl REST API
///
/// Served as JSON at `/openapi.json` and through Swagger UI at `/swagger-ui`
/// when enabled.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "archive-dl REST API",
        version = "0.1.0",
        description = "Create download tasks, submit URLs and retrieve the resulting ZIP archives",
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
        crate::api::routes::submit_urls,
        crate::api::routes::task_status,
        crate::api::routes::download_archive,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        crate::types::TaskId,
        crate::types::TaskCreated,
        crate::types::SubmitUrlsRequest,
        crate::types::SubmitOutcome,
        crate::types::RejectedUrl,
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "tasks", description = "Task creation, URL submission and status"),
        (name = "system", description = "Health and API documentation")
    )
)]
pub struct ApiDoc;
