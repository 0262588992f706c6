// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::vision::VisionError;

/// Uniform error body: `{"error": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    /// A required input field is absent
    MissingField(String),
    /// The request body could not be read as the endpoint's format
    InvalidRequest(String),
    /// The service's models are not loaded in this process
    ServiceUnavailable(String),
    /// Ingest, inference or fusion failed
    Processing(VisionError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.to_string(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::MissingField(msg) => write!(f, "{}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "{}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::Processing(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<VisionError> for ApiError {
    fn from(err: VisionError) -> Self {
        ApiError::Processing(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!("Request failed ({}): {}", status, self);
        } else {
            tracing::debug!("Request rejected ({}): {}", status, self);
        }
        (status, Json(self.to_response())).into_response()
    }
}
