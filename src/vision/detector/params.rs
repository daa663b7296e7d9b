// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fixed invocation parameters for the detector

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Square input dimension used by DocLayout-YOLO
pub const DEFAULT_IMAGE_SIZE: u32 = 1024;

/// Largest accepted square input dimension
pub const MAX_IMAGE_SIZE: u32 = 8192;

/// Minimum confidence a detection needs to be reported
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.2;

/// Execution device for the detection session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComputeDevice {
    #[default]
    Cpu,
    /// CUDA device by ordinal
    Cuda(i32),
}

impl FromStr for ComputeDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "cpu" => Ok(ComputeDevice::Cpu),
            "cuda" | "gpu" => Ok(ComputeDevice::Cuda(0)),
            other => {
                let ordinal = other
                    .strip_prefix("cuda:")
                    .ok_or_else(|| format!("unsupported device '{}', expected cpu, cuda or cuda:N", s))?;
                ordinal
                    .parse::<i32>()
                    .ok()
                    .filter(|id| *id >= 0)
                    .map(ComputeDevice::Cuda)
                    .ok_or_else(|| format!("invalid CUDA device ordinal in '{}'", s))
            }
        }
    }
}

impl fmt::Display for ComputeDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComputeDevice::Cpu => write!(f, "cpu"),
            ComputeDevice::Cuda(id) => write!(f, "cuda:{}", id),
        }
    }
}

impl TryFrom<String> for ComputeDevice {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ComputeDevice> for String {
    fn from(device: ComputeDevice) -> Self {
        device.to_string()
    }
}

/// Parameters fixed at startup and passed on every detector call.
///
/// These never come from the request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    /// Target square dimension for the model input
    pub image_size: u32,
    /// Detections scoring below this are excluded by the detector
    pub confidence_threshold: f32,
    /// Device the detector is expected to run on
    pub device: ComputeDevice,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            image_size: DEFAULT_IMAGE_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            device: ComputeDevice::Cpu,
        }
    }
}
