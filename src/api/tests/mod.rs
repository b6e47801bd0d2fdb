use super::*;
use crate::error::ApiError;
use crate::test_helpers::ScriptedFetcher;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;


/// Router backed by a registry writing into a fresh temp directory
async fn test_app(fetcher: ScriptedFetcher) -> (Router, Arc<TaskRegistry>, TempDir) {
    test_app_with(fetcher, |_| {}).await
}

async fn test_app_with(
    fetcher: ScriptedFetcher,
    customize: impl FnOnce(&mut Config),
) -> (Router, Arc<TaskRegistry>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.archive.archive_dir = temp_dir.path().to_path_buf();
    config.server.api.public_base_url = "http://dl.test".to_string();
    customize(&mut config);
    let config = Arc::new(config);

    let registry = Arc::new(
        TaskRegistry::new(config.clone(), Arc::new(fetcher))
            .await
            .unwrap(),
    );
    let app = create_router(registry.clone(), config);
    (app, registry, temp_dir)
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_json(app: &Router, uri: &str, body: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

async fn error_code(response: Response) -> String {
    body_json::<ApiError>(response).await.error.code
}

/// Poll the status endpoint until the archive link shows up
async fn wait_until_ready(app: &Router, task_id: u64) -> String {
    let uri = format!("/task/{}/status", task_id);
    for _ in 0..500 {
        let text = body_text(get(app, &uri).await).await;
        if text.contains("Archive is ready") {
            return text;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("task {} never became ready", task_id);
}

#[tokio::test]
async fn test_api_server_spawns_and_stops() {
    let (_, registry, _temp_dir) = test_app(ScriptedFetcher::new()).await;

    let mut config = Config::default();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(start_api_server(registry, config, async move {
        let _ = stop_rx.await;
    }));

    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_tx.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cors_enabled() {
    let (app, _registry, _temp_dir) = test_app_with(ScriptedFetcher::new(), |config| {
        config.server.api.cors_enabled = true;
        config.server.api.cors_origins = vec!["*".to_string()];
    })
    .await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_cors_disabled_by_default() {
    let (app, _registry, _temp_dir) = test_app(ScriptedFetcher::new()).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response
            .headers()
            .get("access-control-allow-origin")
            .is_none()
    );
}
