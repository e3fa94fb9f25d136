mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{BrokenEncoder, TextEncoder};
use lookalike::server::{AppState, create_app};
use lookalike::{AssetResolver, EmbeddingStore, MatchEngine};
use rstest::*;
use serde_json::Value;
use tower::ServiceExt;

const BOUNDARY: &str = "X-LOOKALIKE-BOUNDARY";

fn engine() -> MatchEngine {
    let mut store = EmbeddingStore::new();
    store.append("a.jpg", vec![1., 0.]);
    store.append("b b.jpg", vec![0., 1.]);
    MatchEngine::from_store(store).unwrap()
}

#[fixture]
fn ready_app() -> Router {
    let resolver = AssetResolver::new("https://assets.example.org/faces");
    create_app(AppState::new(Some(engine()), Arc::new(TextEncoder(2)), Some(resolver)))
}

#[fixture]
fn unready_app() -> Router {
    create_app(AppState::new(None, Arc::new(TextEncoder(2)), None))
}

fn search_request(file: &[u8]) -> Request<Body> {
    let mut body = vec![];
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        b"Content-Disposition: form-data; name=\"file\"; filename=\"me.jpg\"\r\n",
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/search")
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn search_returns_best_match(ready_app: Router) {
    let resp = ready_app.oneshot(search_request(b"0.1,0.9")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let json = json_body(resp).await;
    assert_eq!(json["identifier"], "b b.jpg");
    assert_eq!(json["index"], 1);
    assert!((json["score"].as_f64().unwrap() - 0.9939).abs() < 1e-3);
    assert_eq!(json["percentage"], "99.39%");
    let url = json["url"].as_str().unwrap();
    assert!(url.starts_with("https://assets.example.org/faces/b%20b.jpg?nocache="));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_image_is_bad_request(ready_app: Router) {
    let resp = ready_app.oneshot(search_request(b"\x89PNG garbage")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"], "invalid_image");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn wrong_dimensionality_is_server_error(ready_app: Router) {
    let resp = ready_app.oneshot(search_request(b"1,2,3")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(resp).await["error"], "dimension_mismatch");
}

#[tokio::test(flavor = "multi_thread")]
async fn encoder_failure_is_server_error() {
    let app = create_app(AppState::new(Some(engine()), Arc::new(BrokenEncoder(2)), None));
    let resp = app.oneshot(search_request(b"1,0")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = json_body(resp).await;
    assert_eq!(json["error"], "encoder_failure");
    assert!(json["message"].as_str().unwrap().contains("model crashed"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cors_preflight_is_allowed(ready_app: Router) {
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/search")
        .header("origin", "https://faces.example.org")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let resp = ready_app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert!(resp.headers().contains_key("access-control-allow-methods"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unready_service_is_unavailable(unready_app: Router) {
    let resp = unready_app.oneshot(search_request(b"1,0")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(resp).await["error"], "service_not_ready");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn health_reports_readiness(ready_app: Router, unready_app: Router) {
    let req = || Request::builder().uri("/health").body(Body::empty()).unwrap();

    let json = json_body(ready_app.oneshot(req()).await.unwrap()).await;
    assert_eq!(json["ready"], true);
    assert_eq!(json["entries"], 2);

    let json = json_body(unready_app.oneshot(req()).await.unwrap()).await;
    assert_eq!(json["ready"], false);
    assert_eq!(json["entries"], 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn metrics_and_docs_are_served(ready_app: Router) {
    let resp = ready_app.clone().oneshot(search_request(b"1,0")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let resp = ready_app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), 1 << 20).await.unwrap();
    assert!(String::from_utf8_lossy(&body).contains("lookalike_search_count"));

    let req = Request::builder().uri("/api-docs/openapi.json").body(Body::empty()).unwrap();
    let json = json_body(ready_app.oneshot(req).await.unwrap()).await;
    assert!(json["paths"]["/search"].is_object());
}
