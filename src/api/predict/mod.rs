// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict API endpoint module
//!
//! Provides POST /predict for detecting layout regions in an image.

pub mod handler;
pub mod mapper;
pub mod request;
pub mod response;

pub use handler::{predict_handler, run_predict, PredictStage};
pub use mapper::map_detections;
pub use request::{Base64ImageRequest, ImageSource, PredictRequest, SourceKind};
pub use response::{Detection, DetectionResponse};
