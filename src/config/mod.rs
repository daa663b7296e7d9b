// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration
//!
//! Values come from (lowest to highest precedence) built-in defaults, an
//! optional TOML file, then CLI flags / environment variables.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::vision::detector::params::{
    ComputeDevice, DetectionParams, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_IMAGE_SIZE,
    MAX_IMAGE_SIZE,
};
use crate::vision::detector::yolo::YoloModelConfig;

/// Default request body limit (64 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body; larger requests get 413
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8082,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Detection model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// ONNX export of the detection weights
    pub weights_path: PathBuf,
    /// Optional JSON class names file
    pub labels_path: Option<PathBuf>,
    pub image_size: u32,
    pub confidence_threshold: f32,
    pub device: ComputeDevice,
    pub intra_threads: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            weights_path: PathBuf::from("./models/doclayout_yolo.onnx"),
            labels_path: None,
            image_size: DEFAULT_IMAGE_SIZE,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            device: ComputeDevice::Cpu,
            intra_threads: 4,
        }
    }
}

impl DetectorConfig {
    /// Fixed parameters handed to the detector on every call
    pub fn detection_params(&self) -> DetectionParams {
        DetectionParams {
            image_size: self.image_size,
            confidence_threshold: self.confidence_threshold.clamp(0.0, 1.0),
            device: self.device,
        }
    }

    pub fn model_config(&self) -> YoloModelConfig {
        YoloModelConfig {
            weights_path: self.weights_path.clone(),
            labels_path: self.labels_path.clone(),
            device: self.device,
            intra_threads: self.intra_threads,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub detector: DetectorConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file. Missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.parse::<IpAddr>().is_err() {
            return Err(ConfigError::Invalid {
                field: "server.host".to_string(),
                message: format!("'{}' is not an IP address", self.server.host),
            });
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Invalid {
                field: "server.max_body_bytes".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        if self.detector.image_size == 0 || self.detector.image_size > MAX_IMAGE_SIZE {
            return Err(ConfigError::Invalid {
                field: "detector.image_size".to_string(),
                message: format!("must be between 1 and {}", MAX_IMAGE_SIZE),
            });
        }

        if !self.detector.confidence_threshold.is_finite() {
            return Err(ConfigError::Invalid {
                field: "detector.confidence_threshold".to_string(),
                message: "must be a finite number".to_string(),
            });
        }

        if self.detector.intra_threads == 0 {
            return Err(ConfigError::Invalid {
                field: "detector.intra_threads".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self
            .server
            .host
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::Invalid {
                field: "server.host".to_string(),
                message: e.to_string(),
            })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}
