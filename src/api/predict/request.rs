// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Predict request extraction and input resolution
//!
//! A predict request carries its image in one of two shapes. Extraction
//! collects whichever candidates the body offers; [`PredictRequest::resolve`]
//! then picks one according to [`RESOLUTION_ORDER`].

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{multipart::MultipartError, Multipart};
use bytes::Bytes;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::errors::RequestError;
use crate::vision::{decode_base64_image, decode_image_bytes, ImageInfo};

/// Multipart part holding the uploaded image
pub const FILE_FIELD: &str = "file";

/// JSON field holding the base64 image
pub const BASE64_FIELD: &str = "image_base64";

pub const NO_SELECTED_FILE: &str = "No selected file";
pub const MISSING_BASE64_FIELD: &str = "Missing 'image_base64' field in JSON body";
pub const BASE64_FIELD_NOT_STRING: &str = "'image_base64' field must be a string";
pub const NO_IMAGE_FOUND: &str = "No image found in request (file or image_base64)";

/// The kinds of image input a predict request may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Multipart,
    Base64Json,
}

/// Inputs are tried in this order; the first one present wins
pub const RESOLUTION_ORDER: [SourceKind; 2] = [SourceKind::Multipart, SourceKind::Base64Json];

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Multipart => write!(f, "multipart"),
            SourceKind::Base64Json => write!(f, "base64-json"),
        }
    }
}

/// A validated image input, not yet decoded
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Multipart { file_name: String, bytes: Bytes },
    Base64Json(String),
}

impl ImageSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            ImageSource::Multipart { .. } => SourceKind::Multipart,
            ImageSource::Base64Json(_) => SourceKind::Base64Json,
        }
    }

    /// Decode into the canonical RGB buffer
    pub fn decode(&self) -> Result<(RgbImage, ImageInfo), RequestError> {
        let decoded = match self {
            ImageSource::Multipart { bytes, .. } => decode_image_bytes(bytes)?,
            ImageSource::Base64Json(encoded) => decode_base64_image(encoded)?,
        };
        Ok(decoded)
    }
}

/// A file part named [`FILE_FIELD`] as it arrived
#[derive(Debug, Clone, PartialEq)]
pub struct FilePart {
    pub file_name: String,
    pub bytes: Bytes,
}

/// JSON request body for base64 uploads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Base64ImageRequest {
    /// Base64 image, optionally data-URL prefixed. Kept untyped so a
    /// non-string value can be reported precisely.
    #[serde(default)]
    pub image_base64: Option<serde_json::Value>,
}

impl Base64ImageRequest {
    /// Parse a JSON body leniently: an unparseable body, or one that is not
    /// a JSON object, counts as having no `image_base64` field.
    pub fn parse(body: &[u8]) -> Option<Self> {
        match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(mut fields)) => Some(Self {
                image_base64: fields.remove(BASE64_FIELD),
            }),
            _ => None,
        }
    }

    pub fn validate(self) -> Result<String, RequestError> {
        match self.image_base64 {
            None | Some(serde_json::Value::Null) => Err(RequestError::client(MISSING_BASE64_FIELD)),
            Some(serde_json::Value::String(encoded)) => Ok(encoded),
            Some(_) => Err(RequestError::client(BASE64_FIELD_NOT_STRING)),
        }
    }
}

/// Candidate inputs found in a predict request
#[derive(Debug, Clone, Default)]
pub struct PredictRequest {
    /// Present when a multipart body had a file part named `file`
    pub file: Option<FilePart>,
    /// Present when the body was declared as JSON; `Some(None)` means it
    /// did not parse as an object
    pub json: Option<Option<Base64ImageRequest>>,
}

impl PredictRequest {
    pub fn from_file(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file: Some(FilePart {
                file_name: file_name.into(),
                bytes: bytes.into(),
            }),
            json: None,
        }
    }

    pub fn from_json_body(body: &[u8]) -> Self {
        Self {
            file: None,
            json: Some(Base64ImageRequest::parse(body)),
        }
    }

    /// Pick the image source following [`RESOLUTION_ORDER`] and validate it
    pub fn resolve(mut self) -> Result<ImageSource, RequestError> {
        for kind in RESOLUTION_ORDER {
            match kind {
                SourceKind::Multipart => {
                    if let Some(file) = self.file.take() {
                        if file.file_name.is_empty() {
                            return Err(RequestError::client(NO_SELECTED_FILE));
                        }
                        return Ok(ImageSource::Multipart {
                            file_name: file.file_name,
                            bytes: file.bytes,
                        });
                    }
                }
                SourceKind::Base64Json => {
                    if let Some(body) = self.json.take() {
                        let encoded = body.unwrap_or_default().validate()?;
                        return Ok(ImageSource::Base64Json(encoded));
                    }
                }
            }
        }

        Err(RequestError::client(NO_IMAGE_FOUND))
    }
}

/// Map a multipart read failure to a response. Body-limit failures keep
/// their 413; anything else is a malformed request.
fn multipart_rejection(err: MultipartError, context: &str) -> Response {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return err.into_response();
    }
    RequestError::client(format!("{}: {}", context, err)).into_response()
}

async fn read_file_part(mut multipart: Multipart) -> Result<Option<FilePart>, Response> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_rejection(e, "Invalid multipart body"))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // A part without a filename parameter is a plain form field
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_rejection(e, "Failed to read uploaded file"))?;
        return Ok(Some(FilePart { file_name, bytes }));
    }
    Ok(None)
}

#[async_trait]
impl<S> FromRequest<S> for PredictRequest
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| {
                    RequestError::client(format!("Invalid multipart body: {}", e)).into_response()
                })?;
            let file = read_file_part(multipart).await?;
            return Ok(Self { file, json: None });
        }

        if content_type.contains("application/json") {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            return Ok(Self::from_json_body(&body));
        }

        Ok(Self::default())
    }
}
