// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLO layout detection model on ONNX Runtime
//!
//! Loads an ONNX export of DocLayout-YOLO (or any Ultralytics YOLO export)
//! once at startup and serves detections for the predict endpoint.

use anyhow::{Context, Result};
use image::RgbImage;
use ort::ep::{CPU as CPUExecutionProvider, CUDA as CUDAExecutionProvider};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::labels::ClassNames;
use super::params::{ComputeDevice, DetectionParams};
use super::postprocess::decode_output;
use super::preprocessing::preprocess_for_detection;
use super::{Detector, NativeDetection};

/// Settings needed to load a [`YoloDetector`]
#[derive(Debug, Clone)]
pub struct YoloModelConfig {
    /// Path to the ONNX weights
    pub weights_path: PathBuf,
    /// Optional JSON labels file; DocLayout names are used when absent
    pub labels_path: Option<PathBuf>,
    /// Requested execution device
    pub device: ComputeDevice,
    /// ONNX Runtime intra-op threads
    pub intra_threads: usize,
}

/// YOLO detector backed by an ONNX Runtime session
#[derive(Clone)]
pub struct YoloDetector {
    /// ONNX Runtime session; `run` needs exclusive access
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Device the session was actually built for
    device: ComputeDevice,
    class_names: Arc<ClassNames>,
}

impl std::fmt::Debug for YoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetector")
            .field("input_name", &self.input_name)
            .field("device", &self.device)
            .field("num_classes", &self.class_names.len())
            .finish_non_exhaustive()
    }
}

impl YoloDetector {
    /// Load the detection model
    ///
    /// # Errors
    /// Returns error if:
    /// - Weights or labels file not found or invalid
    /// - ONNX Runtime initialization fails
    pub fn load(config: &YoloModelConfig) -> Result<Self> {
        let weights_path = config.weights_path.as_path();

        if !weights_path.exists() {
            anyhow::bail!("Detection weights not found: {}", weights_path.display());
        }

        let class_names = match config.labels_path {
            Some(ref path) => {
                let names = ClassNames::from_file(path)?;
                info!("Loaded {} class names from {}", names.len(), path.display());
                names
            }
            None => ClassNames::default(),
        };

        info!(
            "Loading detection model from {} (device: {})",
            weights_path.display(),
            config.device
        );

        let (session, device) = match config.device {
            ComputeDevice::Cpu => (
                Self::build_cpu_session(weights_path, config.intra_threads)?,
                ComputeDevice::Cpu,
            ),
            ComputeDevice::Cuda(device_id) => {
                match Self::build_cuda_session(weights_path, device_id, config.intra_threads) {
                    Ok(session) => {
                        info!("✅ CUDA execution provider initialized on device {}", device_id);
                        (session, ComputeDevice::Cuda(device_id))
                    }
                    Err(e) => {
                        warn!("⚠️  CUDA execution provider failed: {}", e);
                        warn!("   Falling back to CPU execution provider");
                        (
                            Self::build_cpu_session(weights_path, config.intra_threads)?,
                            ComputeDevice::Cpu,
                        )
                    }
                }
            }
        };

        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .unwrap_or_else(|| "images".to_string());

        if let Some(input) = session.inputs().first() {
            debug!("Detection model input {}: {:?}", input_name, input.dtype());
        }
        if let Some(output) = session.outputs().first() {
            debug!("Detection model output {}: {:?}", output.name(), output.dtype());
        }

        info!("✅ Detection model loaded ({} classes)", class_names.len());

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            device,
            class_names: Arc::new(class_names),
        })
    }

    fn build_cpu_session(weights_path: &Path, intra_threads: usize) -> Result<Session> {
        Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .map_err(ort::Error::<()>::from)
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort::Error::<()>::from)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .map_err(ort::Error::<()>::from)
            .context("Failed to set intra threads")?
            .commit_from_file(weights_path)
            .context(format!(
                "Failed to load detection model from {}",
                weights_path.display()
            ))
    }

    fn build_cuda_session(
        weights_path: &Path,
        device_id: i32,
        intra_threads: usize,
    ) -> Result<Session> {
        Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CUDAExecutionProvider::default()
                .with_device_id(device_id)
                .build()
                .error_on_failure()])
            .map_err(ort::Error::<()>::from)
            .context("Failed to set CUDA execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort::Error::<()>::from)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .map_err(ort::Error::<()>::from)
            .context("Failed to set intra threads")?
            .commit_from_file(weights_path)
            .context(format!(
                "Failed to load detection model from {}",
                weights_path.display()
            ))
    }

    /// Device the session runs on, after any CUDA fallback
    pub fn device(&self) -> ComputeDevice {
        self.device
    }
}

impl Detector for YoloDetector {
    fn detect(
        &self,
        image: &RgbImage,
        params: &DetectionParams,
    ) -> Result<Vec<NativeDetection>> {
        if params.device != self.device {
            anyhow::bail!(
                "Detection requested on {} but the model session runs on {}",
                params.device,
                self.device
            );
        }

        let started = Instant::now();
        let (input, letterbox) = preprocess_for_detection(image, params.image_size);

        let input_value =
            Value::from_array(input).context("Failed to create input tensor")?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Detection session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        debug!("Detection output shape: {:?}", output_tensor.shape());

        let detections =
            decode_output(output_tensor.view(), &letterbox, params.confidence_threshold)?;

        debug!(
            "Detected {} regions in {}ms",
            detections.len(),
            started.elapsed().as_millis()
        );

        Ok(detections)
    }

    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }
}
