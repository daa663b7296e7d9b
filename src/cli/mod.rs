// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use clap::Parser;
use std::path::PathBuf;

use crate::config::{AppConfig, ConfigError};
use crate::vision::ComputeDevice;

/// Layout detection node
#[derive(Parser, Debug, Default)]
#[command(name = "layout-detect-node")]
#[command(version)]
#[command(about = "HTTP service returning layout regions detected in uploaded images", long_about = None)]
pub struct Cli {
    /// TOML config file; flags and env vars override its values
    #[arg(long, env = "CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "API_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "API_PORT")]
    pub port: Option<u16>,

    /// ONNX weights of the detection model
    #[arg(long, env = "WEIGHTS_PATH")]
    pub weights: Option<PathBuf>,

    /// JSON file with class names (array or id -> name object)
    #[arg(long, env = "LABELS_PATH")]
    pub labels: Option<PathBuf>,

    /// Square model input size
    #[arg(long, env = "IMAGE_SIZE")]
    pub image_size: Option<u32>,

    /// Minimum detection confidence
    #[arg(long, env = "CONFIDENCE_THRESHOLD")]
    pub confidence: Option<f32>,

    /// Execution device (cpu, cuda, cuda:N)
    #[arg(long, env = "DEVICE")]
    pub device: Option<ComputeDevice>,

    /// ONNX Runtime intra-op threads
    #[arg(long, env = "INTRA_THREADS")]
    pub intra_threads: Option<usize>,

    /// Maximum request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES")]
    pub max_body_bytes: Option<usize>,
}

impl Cli {
    /// Resolve the final configuration: defaults, then the config file,
    /// then any flag or env var that was set.
    pub fn into_config(self) -> Result<AppConfig, ConfigError> {
        let mut config = match self.config {
            Some(ref path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };

        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(max_body_bytes) = self.max_body_bytes {
            config.server.max_body_bytes = max_body_bytes;
        }
        if let Some(weights) = self.weights {
            config.detector.weights_path = weights;
        }
        if let Some(labels) = self.labels {
            config.detector.labels_path = Some(labels);
        }
        if let Some(image_size) = self.image_size {
            config.detector.image_size = image_size;
        }
        if let Some(confidence) = self.confidence {
            config.detector.confidence_threshold = confidence;
        }
        if let Some(device) = self.device {
            config.detector.device = device;
        }
        if let Some(intra_threads) = self.intra_threads {
            config.detector.intra_threads = intra_threads;
        }

        config.validate()?;
        Ok(config)
    }
}
