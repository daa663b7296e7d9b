// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection capability consumed by the predict endpoint
//!
//! Components:
//! - `params` - Fixed invocation parameters (size, threshold, device)
//! - `labels` - Class id to name table owned by the detector
//! - `preprocessing` - Letterbox resize and tensor conversion
//! - `postprocess` - Decoding raw YOLO outputs into detections
//! - `yolo` - ONNX Runtime YOLO detector

pub mod labels;
pub mod params;
pub mod postprocess;
pub mod preprocessing;
pub mod yolo;

use image::RgbImage;

pub use labels::{ClassNames, DOCLAYOUT_CLASS_NAMES};
pub use params::{ComputeDevice, DetectionParams};
pub use yolo::YoloDetector;

/// One candidate region as emitted by a detector
#[derive(Debug, Clone, PartialEq)]
pub struct NativeDetection {
    /// `[x1, y1, x2, y2]` in pixel units of the original image
    pub xyxy: [f32; 4],
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// Index into the detector's class table
    pub class_id: u32,
}

/// A loaded detection model.
///
/// Implementations are constructed once at startup and shared across all
/// requests, so `detect` takes `&self` and may be called concurrently.
/// Calls block the current thread for the duration of inference.
#[cfg_attr(test, mockall::automock)]
pub trait Detector: Send + Sync {
    /// Run detection on a canonical RGB image.
    ///
    /// Detections below `params.confidence_threshold` are already excluded.
    /// The returned order is the model's emission order.
    fn detect(
        &self,
        image: &RgbImage,
        params: &DetectionParams,
    ) -> anyhow::Result<Vec<NativeDetection>>;

    /// The id to name table this detector was loaded with
    fn class_names(&self) -> &ClassNames;
}
