// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /predict with JSON base64 bodies

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use serde_json::json;

use super::support::{app, detection, encode_image, json_request, send, FakeDetector};

#[tokio::test]
async fn test_plain_base64_success() {
    let detector = FakeDetector::returning(vec![detection([1.0, 2.0, 3.0, 4.0], 0.5, 7)]);
    let encoded = STANDARD.encode(encode_image(20, 10, ImageFormat::Png));

    let (status, response) = send(
        app(detector.clone()),
        json_request(json!({"image_base64": encoded})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["num_detections"], 1);
    assert_eq!(response["detections"][0]["class_name"], "table_footnote");
    assert_eq!(detector.calls(), vec![(20, 10)]);
}

#[tokio::test]
async fn test_data_url_prefix_is_stripped() {
    let detector = FakeDetector::returning(vec![]);
    let encoded = format!(
        "data:image/jpeg;base64,{}",
        STANDARD.encode(encode_image(12, 9, ImageFormat::Jpeg))
    );

    let (status, response) = send(
        app(detector.clone()),
        json_request(json!({"image_base64": encoded})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({"num_detections": 0, "detections": []}));
    assert_eq!(detector.calls(), vec![(12, 9)]);
}

#[tokio::test]
async fn test_invalid_base64() {
    let detector = FakeDetector::returning(vec![]);

    let (status, response) = send(
        app(detector.clone()),
        json_request(json!({"image_base64": "%%%not-base64%%%"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response, json!({"error": "Invalid base64 string"}));
    assert!(detector.calls().is_empty());
}

#[tokio::test]
async fn test_missing_field() {
    let (status, response) = send(
        app(FakeDetector::returning(vec![])),
        json_request(json!({"image": "AAAA"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response["error"],
        "Missing 'image_base64' field in JSON body"
    );
}

#[tokio::test]
async fn test_field_must_be_string() {
    let (status, response) = send(
        app(FakeDetector::returning(vec![])),
        json_request(json!({"image_base64": ["AAAA"]})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "'image_base64' field must be a string");
}

#[tokio::test]
async fn test_valid_base64_but_not_an_image() {
    let detector = FakeDetector::returning(vec![]);
    let encoded = STANDARD.encode(b"hello, world");

    let (status, response) = send(
        app(detector.clone()),
        json_request(json!({"image_base64": encoded})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].is_string());
    assert!(detector.calls().is_empty());
}

#[tokio::test]
async fn test_empty_post_finds_no_image() {
    let detector = FakeDetector::returning(vec![]);

    let (status, response) = send(
        app(detector.clone()),
        Request::post("/predict").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response,
        json!({"error": "No image found in request (file or image_base64)"})
    );
    assert!(detector.calls().is_empty());
}

#[tokio::test]
async fn test_detector_failure_is_server_error() {
    let encoded = STANDARD.encode(encode_image(4, 4, ImageFormat::Png));

    let (status, response) = send(
        app(FakeDetector::failing("CUDA out of memory")),
        json_request(json!({"image_base64": encoded})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["error"], "CUDA out of memory");
}

#[tokio::test]
async fn test_array_body_is_not_an_object() {
    let detector = FakeDetector::returning(vec![]);
    let encoded = STANDARD.encode(encode_image(4, 4, ImageFormat::Png));

    let (status, response) = send(app(detector.clone()), json_request(json!([encoded]))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response["error"],
        "Missing 'image_base64' field in JSON body"
    );
    assert!(detector.calls().is_empty());
}
