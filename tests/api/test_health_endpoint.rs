// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;

use super::support::{app, send, FakeDetector};

#[tokio::test]
async fn test_health_ok() {
    let (status, body) = send(
        app(FakeDetector::returning(vec![])),
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

/// Health reports liveness even when every detection would fail
#[tokio::test]
async fn test_health_ignores_detector_state() {
    let detector = FakeDetector::failing("model unloaded");
    let (status, body) = send(
        app(detector.clone()),
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(detector.calls().is_empty());
}

#[tokio::test]
async fn test_health_rejects_post() {
    let (status, _) = send(
        app(FakeDetector::returning(vec![])),
        Request::post("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
