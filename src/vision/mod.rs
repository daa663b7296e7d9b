// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module
//!
//! This module provides:
//! - Image decoding into canonical RGB buffers
//! - Object (document layout) detection via YOLO on ONNX Runtime

pub mod detector;
pub mod image_utils;

pub use detector::{
    ClassNames, ComputeDevice, DetectionParams, Detector, NativeDetection, YoloDetector,
};
pub use image_utils::{
    decode_base64_image, decode_base64_payload, decode_image_bytes, detect_format,
    strip_data_url_prefix, ImageError, ImageInfo,
};
