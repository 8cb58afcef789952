use super::*;
use crate::engine::test_helpers::{FakePublisher, create_test_engine, create_test_engine_with};
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use tower::ServiceExt;


/// Router over a fresh test engine
async fn test_app() -> (Router, Arc<DraftSyncEngine>, tempfile::TempDir) {
    let (engine, temp_dir) = create_test_engine().await;
    let engine = Arc::new(engine);
    let app = create_router(engine.clone(), engine.get_config());
    (app, engine, temp_dir)
}

/// Router over a test engine publishing through `publisher`
async fn test_app_with(
    publisher: Arc<FakePublisher>,
) -> (Router, Arc<DraftSyncEngine>, tempfile::TempDir) {
    let (engine, temp_dir) = create_test_engine_with(publisher).await;
    let engine = Arc::new(engine);
    let app = create_router(engine.clone(), engine.get_config());
    (app, engine, temp_dir)
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).expect("response should be valid JSON")
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (engine, _temp_dir) = create_test_engine().await;
    let engine = Arc::new(engine);

    let mut config = (*engine.get_config()).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let engine = engine.clone();
        let config = config.clone();
        async move { start_api_server(engine, config).await }
    });

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(!api_handle.is_finished(), "server should still be running");
    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let (app, _engine, _temp_dir) = test_app().await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

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
    let (engine, _temp_dir) = create_test_engine().await;
    let engine = Arc::new(engine);
    let mut config = (*engine.get_config()).clone();
    config.api.cors_enabled = false;
    let app = create_router(engine, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}
