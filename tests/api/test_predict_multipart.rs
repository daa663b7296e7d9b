// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /predict with multipart uploads

use axum::http::StatusCode;
use image::ImageFormat;
use serde_json::json;

use super::support::{
    app, detection, encode_image, multipart_body, multipart_request, send, FakeDetector,
};

#[tokio::test]
async fn test_multipart_success() {
    let detector = FakeDetector::returning(vec![
        detection([10.0, 20.0, 200.5, 80.25], 0.91, 0),
        detection([12.0, 100.0, 590.0, 700.0], 0.64, 1),
        detection([300.0, 720.0, 580.0, 790.0], 0.33, 3),
    ]);
    let body = multipart_body("file", Some("page.png"), &encode_image(64, 48, ImageFormat::Png));

    let (status, response) = send(app(detector.clone()), multipart_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["num_detections"], 3);
    assert_eq!(
        response["detections"][0],
        json!({
            "bbox": [10.0, 20.0, 200.5, 80.25],
            "confidence": 0.91,
            "class_id": 0,
            "class_name": "title"
        })
    );
    assert_eq!(response["detections"][1]["class_name"], "plain text");
    assert_eq!(response["detections"][2]["class_name"], "figure");
    assert_eq!(detector.calls(), vec![(64, 48)]);
}

#[tokio::test]
async fn test_blank_jpeg_has_no_detections() {
    let detector = FakeDetector::returning(vec![]);
    let body = multipart_body("file", Some("blank.jpg"), &encode_image(2, 2, ImageFormat::Jpeg));

    let (status, response) = send(app(detector.clone()), multipart_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({"num_detections": 0, "detections": []}));
    assert_eq!(detector.calls(), vec![(2, 2)]);
}

#[tokio::test]
async fn test_detection_order_is_preserved() {
    // Lower confidence first: the service must not re-sort
    let detector = FakeDetector::returning(vec![
        detection([0.0, 0.0, 1.0, 1.0], 0.25, 5),
        detection([0.0, 0.0, 2.0, 2.0], 0.95, 2),
        detection([0.0, 0.0, 3.0, 3.0], 0.50, 5),
    ]);
    let body = multipart_body("file", Some("page.png"), &encode_image(8, 8, ImageFormat::Png));

    let (status, response) = send(app(detector), multipart_request(body)).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = response["detections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["class_id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![5, 2, 5]);
    assert_eq!(response["detections"][0]["class_name"], "table");
    assert_eq!(response["detections"][1]["class_name"], "abandon");
}

#[tokio::test]
async fn test_empty_filename_is_rejected() {
    let detector = FakeDetector::returning(vec![]);
    let body = multipart_body("file", Some(""), &encode_image(4, 4, ImageFormat::Png));

    let (status, response) = send(app(detector.clone()), multipart_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response, json!({"error": "No selected file"}));
    assert!(detector.calls().is_empty());
}

#[tokio::test]
async fn test_wrong_field_name_finds_no_image() {
    let detector = FakeDetector::returning(vec![]);
    let body = multipart_body("upload", Some("page.png"), &encode_image(4, 4, ImageFormat::Png));

    let (status, response) = send(app(detector.clone()), multipart_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response["error"],
        "No image found in request (file or image_base64)"
    );
    assert!(detector.calls().is_empty());
}

#[tokio::test]
async fn test_file_field_without_filename_is_ignored() {
    let detector = FakeDetector::returning(vec![]);
    let body = multipart_body("file", None, b"just a form value");

    let (status, response) = send(app(detector), multipart_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response["error"],
        "No image found in request (file or image_base64)"
    );
}

#[tokio::test]
async fn test_non_image_upload_is_client_error() {
    let detector = FakeDetector::returning(vec![]);
    let body = multipart_body("file", Some("notes.txt"), b"these are not pixels");

    let (status, response) = send(app(detector.clone()), multipart_request(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["error"].is_string());
    assert!(detector.calls().is_empty());
}

#[tokio::test]
async fn test_detector_failure_is_server_error() {
    let detector = FakeDetector::failing("inference backend crashed");
    let body = multipart_body("file", Some("page.png"), &encode_image(16, 16, ImageFormat::Png));

    let (status, response) = send(app(detector), multipart_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response, json!({"error": "inference backend crashed"}));
}

#[tokio::test]
async fn test_unknown_class_is_server_error() {
    let detector = FakeDetector::returning(vec![detection([0.0, 0.0, 1.0, 1.0], 0.9, 42)]);
    let body = multipart_body("file", Some("page.png"), &encode_image(16, 16, ImageFormat::Png));

    let (status, response) = send(app(detector), multipart_request(body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["error"], "Unknown class id 42");
}
