// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image decoding into the canonical RGB buffer used for detection

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{ImageFormat, RgbImage};
use thiserror::Error;

/// Custom error types for image decoding
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid base64 string")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected source format
    pub format: ImageFormat,
    /// Size of the encoded data in bytes
    pub size_bytes: usize,
}

/// Strip a data-URL prefix (`data:image/png;base64,`) if present.
///
/// Everything up to and including the first comma is removed; strings
/// without a comma are returned unchanged.
pub fn strip_data_url_prefix(input: &str) -> &str {
    match input.split_once(',') {
        Some((_, payload)) => payload,
        None => input,
    }
}

/// Decode a base64 payload, optionally carrying a data-URL prefix, into
/// raw bytes. ASCII whitespace inside the payload is ignored.
pub fn decode_base64_payload(input: &str) -> Result<Vec<u8>, ImageError> {
    let payload = strip_data_url_prefix(input);

    let bytes = if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        STANDARD.decode(compact)?
    } else {
        STANDARD.decode(payload)?
    };

    Ok(bytes)
}

/// Decode a base64-encoded image (data-URL prefix allowed)
///
/// # Example
/// ```ignore
/// let (image, info) = decode_base64_image("data:image/png;base64,iVBORw0KGgo...")?;
/// println!("Image size: {}x{}", info.width, info.height);
/// ```
pub fn decode_base64_image(input: &str) -> Result<(RgbImage, ImageInfo), ImageError> {
    let bytes = decode_base64_payload(input)?;
    decode_image_bytes(&bytes)
}

/// Decode raw image bytes (for multipart uploads) into an RGB buffer.
///
/// Palette, grayscale, 16-bit and alpha-bearing images are converted to
/// 8-bit RGB; alpha is dropped.
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(RgbImage, ImageInfo), ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img.to_rgb8(), info))
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    image::guess_format(bytes).map_err(|_| ImageError::UnsupportedFormat)
}
