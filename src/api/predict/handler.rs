// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict endpoint handler

use axum::{extract::State, Json};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::mapper::map_detections;
use super::request::PredictRequest;
use super::response::DetectionResponse;
use crate::api::errors::RequestError;
use crate::api::http_server::AppState;
use crate::vision::{DetectionParams, Detector};

/// Stage of a predict request at which it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictStage {
    Normalizing,
    Detecting,
    Mapping,
}

impl fmt::Display for PredictStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictStage::Normalizing => write!(f, "normalizing"),
            PredictStage::Detecting => write!(f, "detecting"),
            PredictStage::Mapping => write!(f, "mapping"),
        }
    }
}

fn failed(stage: PredictStage, err: RequestError) -> RequestError {
    warn!("Predict failed while {} ({}): {}", stage, err.status_code(), err);
    err
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run one predict request: normalize, detect, map.
///
/// Input problems surface as [`RequestError::ClientInput`]; everything
/// after normalization surfaces as [`RequestError::Server`]. Each request
/// is attempted exactly once.
pub async fn run_predict(
    detector: Arc<dyn Detector>,
    params: DetectionParams,
    request: PredictRequest,
) -> Result<DetectionResponse, RequestError> {
    let started = Instant::now();

    // 1. Normalize
    let source = request
        .resolve()
        .map_err(|e| failed(PredictStage::Normalizing, e))?;
    debug!("Predict input resolved from {}", source.kind());

    let (image, image_info) = source
        .decode()
        .map_err(|e| failed(PredictStage::Normalizing, e))?;
    drop(source);

    debug!(
        "Decoded image: {}x{} {:?}, {} bytes",
        image_info.width, image_info.height, image_info.format, image_info.size_bytes
    );

    // 2. Detect (blocks for the duration of inference)
    let worker = Arc::clone(&detector);
    let raw = tokio::task::spawn_blocking(move || worker.detect(&image, &params))
        .await
        .map_err(|e| {
            let message = if e.is_panic() {
                format!("Detection panicked: {}", panic_message(e.into_panic()))
            } else {
                format!("Detection task failed: {}", e)
            };
            failed(PredictStage::Detecting, RequestError::server(message))
        })?
        .map_err(|e| failed(PredictStage::Detecting, RequestError::server(format!("{:#}", e))))?;

    // 3. Map
    let detections = map_detections(raw, detector.class_names())
        .map_err(|e| failed(PredictStage::Mapping, e))?;

    // 4. Respond
    let response = DetectionResponse::new(detections);

    info!(
        "Predict complete: {} detections, {}ms",
        response.num_detections,
        started.elapsed().as_millis()
    );

    Ok(response)
}

/// POST /predict - Detect regions in an uploaded image
///
/// # Request
/// - `multipart/form-data` with a file part named `file`, or
/// - `application/json` with `{"image_base64": "<base64, optionally data-URL prefixed>"}`
///
/// A file part takes precedence when both could apply.
///
/// # Response
/// - `num_detections`: Number of detections
/// - `detections`: `bbox` `[x1, y1, x2, y2]`, `confidence`, `class_id`, `class_name`
///
/// # Errors
/// - 400 Bad Request: `{"error": ...}` for missing, empty or undecodable input
/// - 500 Internal Server Error: `{"error": ...}` for detection or mapping failures
pub async fn predict_handler(
    State(state): State<AppState>,
    request: PredictRequest,
) -> Result<Json<DetectionResponse>, RequestError> {
    run_predict(state.detector, state.params, request)
        .await
        .map(Json)
}
