// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the layout detection node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-layout-detection-2025-10-16";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-10-16";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "multipart-upload",
    "base64-json",
    "data-url-prefix",
    "yolo-end-to-end",
    "yolo-raw-head",
    "cuda-fallback",
];

/// Get a formatted version string for logging
pub fn get_version_string() -> String {
    format!("{} ({})", VERSION, BUILD_DATE)
}
