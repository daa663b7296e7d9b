// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use layout_detect_node::{
    api::{start_server, AppState},
    cli::Cli,
    version,
    vision::{Detector, YoloDetector},
};
use std::{env, sync::Arc};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("Starting {}", version::get_version_string());

    let config = Cli::parse()
        .into_config()
        .context("Invalid configuration")?;

    info!(
        "Detection settings: image size {}, confidence threshold {}",
        config.detector.image_size, config.detector.confidence_threshold
    );

    // A service that cannot load its model does not start
    let detector = YoloDetector::load(&config.detector.model_config())
        .context("Failed to load detection model")?;

    let mut params = config.detector.detection_params();
    if params.device != detector.device() {
        warn!(
            "Requested device {} unavailable, running on {}",
            params.device,
            detector.device()
        );
        params.device = detector.device();
    }

    info!(
        "Detection model ready: {} classes",
        detector.class_names().len()
    );

    let state = AppState::new(Arc::new(detector), params);
    start_server(&config, state).await
}
