// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vision::ImageError;

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

/// Classified failure of a predict request
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RequestError {
    /// Malformed, missing or undecodable input
    #[error("{0}")]
    ClientInput(String),

    /// Anything else: detector faults, mapping failures, worker panics
    #[error("{0}")]
    Server(String),
}

impl RequestError {
    pub fn client(message: impl Into<String>) -> Self {
        RequestError::ClientInput(message.into())
    }

    pub fn server(message: impl Into<String>) -> Self {
        RequestError::Server(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::ClientInput(_) => StatusCode::BAD_REQUEST,
            RequestError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            RequestError::ClientInput(msg) | RequestError::Server(msg) => msg,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.message().to_string(),
        }
    }
}

impl From<ImageError> for RequestError {
    fn from(err: ImageError) -> Self {
        RequestError::ClientInput(err.to_string())
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_response())).into_response()
    }
}
