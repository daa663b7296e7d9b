// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict response types

use serde::{Deserialize, Serialize};

/// A detected region
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    /// `[x1, y1, x2, y2]` in pixels of the submitted image
    pub bbox: [f32; 4],
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    pub class_id: u32,
    pub class_name: String,
}

/// Response from POST /predict
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionResponse {
    /// Always equal to `detections.len()`
    pub num_detections: usize,
    /// In detector emission order
    pub detections: Vec<Detection>,
}

impl DetectionResponse {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            num_detections: detections.len(),
            detections,
        }
    }
}
