// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Conversion of detector output into the public response schema

use super::response::Detection;
use crate::api::errors::RequestError;
use crate::vision::{ClassNames, NativeDetection};

/// Map raw detections to response records, resolving class names through
/// the detector's own table. Order and values pass through unchanged.
pub fn map_detections(
    raw: Vec<NativeDetection>,
    names: &ClassNames,
) -> Result<Vec<Detection>, RequestError> {
    raw.into_iter()
        .map(|d| {
            let class_name = names
                .get(d.class_id)
                .ok_or_else(|| RequestError::server(format!("Unknown class id {}", d.class_id)))?;
            Ok(Detection {
                bbox: d.xyxy,
                confidence: d.confidence,
                class_id: d.class_id,
                class_name: class_name.to_string(),
            })
        })
        .collect()
}
