//! Integration tests for the HTTP front end.
//!
//! Requests go straight to the router via `tower::ServiceExt`, without a TCP
//! listener.

#![allow(clippy::unwrap_used)]

use std::fs;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bluespx::data::SnapshotStore;
use bluespx::measurement::SampleVector;
use bluespx::server::build_router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

fn router(store: &SnapshotStore) -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("index.html"), "<html>bluespx</html>").unwrap();
    (build_router(store.clone(), dir.path()), dir)
}

fn rpc_post(payload: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/rpc")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("rpc={payload}")))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_scale_is_null_before_capture() {
    let store = SnapshotStore::new();
    let (app, _dir) = router(&store);

    let response = app.oneshot(rpc_post(r#"{"Cmd":"scale"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["Error"], "");
    assert!(body["Values"].is_null());
}

#[tokio::test]
async fn test_scale_and_sample_after_capture() {
    let store = SnapshotStore::new();
    store.publish_wavelengths(SampleVector::from(vec![400, 401, 402]));
    store.publish_intensities(SampleVector::from(vec![17, 3, 9]));
    let (app, _dir) = router(&store);

    let scale = json_body(
        app.clone()
            .oneshot(rpc_post(r#"{"Cmd":"scale"}"#))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(scale["Values"], serde_json::json!([400, 401, 402]));

    let sample = json_body(app.oneshot(rpc_post(r#"{"Cmd":"sample"}"#)).await.unwrap()).await;
    assert_eq!(sample["Values"], serde_json::json!([17, 3, 9]));
    assert_eq!(sample["Error"], "");
}

#[tokio::test]
async fn test_query_string_is_accepted() {
    let store = SnapshotStore::new();
    store.publish_intensities(SampleVector::from(vec![1, 2]));
    let (app, _dir) = router(&store);

    let request = Request::builder()
        .uri("/rpc?rpc=%7B%22Cmd%22%3A%22sample%22%7D")
        .body(Body::empty())
        .unwrap();
    let body = json_body(app.oneshot(request).await.unwrap()).await;
    assert_eq!(body["Values"], serde_json::json!([1, 2]));
}

#[tokio::test]
async fn test_unsupported_command_reported_in_body() {
    let store = SnapshotStore::new();
    let (app, _dir) = router(&store);

    let response = app.oneshot(rpc_post(r#"{"Cmd":"reboot"}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["Error"], "unsupported command");
    assert!(body["Values"].is_null());
}

#[tokio::test]
async fn test_malformed_json_reported_in_body() {
    let store = SnapshotStore::new();
    let (app, _dir) = router(&store);

    let body = json_body(app.oneshot(rpc_post("{oops")).await.unwrap()).await;
    assert_ne!(body["Error"], "");
}

#[tokio::test]
async fn test_non_form_post_reported_in_body() {
    let store = SnapshotStore::new();
    store.publish_wavelengths(SampleVector::from(vec![400, 401]));
    let (app, _dir) = router(&store);

    let json_post = Request::builder()
        .method("POST")
        .uri("/rpc")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"Cmd":"scale"}"#))
        .unwrap();
    let response = app.clone().oneshot(json_post).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_ne!(body["Error"], "");
    assert!(body["Values"].is_null());

    let bare_post = Request::builder()
        .method("POST")
        .uri("/rpc")
        .body(Body::from("rpc=whatever"))
        .unwrap();
    let response = app.oneshot(bare_post).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_ne!(json_body(response).await["Error"], "");
}

#[tokio::test]
async fn test_static_files_are_served() {
    let store = SnapshotStore::new();
    let (app, _dir) = router(&store);

    let request = Request::builder()
        .uri("/index.html")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<html>bluespx</html>");
}

#[tokio::test]
async fn test_bundled_spectrum_page_is_served() {
    let web = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("web");
    let app = build_router(SnapshotStore::new(), &web);

    for uri in ["/index.html", "/js/lib.js"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn test_missing_static_file_is_404() {
    let store = SnapshotStore::new();
    let (app, _dir) = router(&store);

    let request = Request::builder()
        .uri("/missing.js")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
