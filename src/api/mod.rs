//! REST API server module
//!
//! Exposes task creation, URL submission, status polling and archive
//! retrieval over HTTP, plus health and OpenAPI endpoints.

use crate::{Config, Result, TaskRegistry};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::future::Future;
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
/// - `GET /CreateTask` - Create a task (refused while too many tasks are busy)
/// - `POST /task/:id/download` - Submit URLs, body `{"URLs": [...]}`
/// - `GET /task/:id/status` - Plain-text status, with the archive link once ready
///
/// ## Archives
/// - `GET /archives/:archive` - Download an `Archiv<id>.zip` from the archive directory
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
pub fn create_router(registry: Arc<TaskRegistry>, config: Arc<Config>) -> Router {
    let state = AppState::new(registry, config.clone());

    let router = Router::new()
        // Tasks
        .route("/CreateTask", get(routes::create_task))
        .route("/task/:id/download", post(routes::submit_urls))
        .route("/task/:id/status", get(routes::task_status))
        // Archives
        .route("/archives/:archive", get(routes::download_archive))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec));

    // SwaggerUi registers its own document route; it must not collide with /openapi.json
    let router = if config.server.api.swagger_ui {
        router.merge(
            SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
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

/// Build a CORS layer based on configured origins
///
/// `"*"` (or an empty list) allows any origin.
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

/// Start the API server on the configured bind address
///
/// Serves until `shutdown` resolves, then stops accepting connections and
/// waits for in-flight requests. Draining downloads and finalizing archives
/// is left to [`TaskRegistry::shutdown`].
///
/// # Example
///
/// ```no_run
/// use archive_dl::{Config, HttpFetcher, TaskRegistry};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let fetcher = Arc::new(HttpFetcher::new(&config.fetch)?);
/// let registry = Arc::new(TaskRegistry::new(config.clone(), fetcher).await?);
///
/// archive_dl::api::start_api_server(registry.clone(), config, async {
///     let _ = tokio::signal::ctrl_c().await;
/// })
/// .await?;
/// registry.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server<F>(
    registry: Arc<TaskRegistry>,
    config: Arc<Config>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(registry, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(
        address = %listener.local_addr().unwrap_or(bind_address),
        "API server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
