// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Walk-along endpoint handlers

use axum::{extract::State, Json};
use axum_extra::extract::{multipart::MultipartRejection, Multipart};
use bytes::Bytes;
use tracing::{debug, warn};

use super::response::WalkAlongResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::{decode, IngestMode, VisionError};

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Message returned when no `image` part was uploaded
pub const NO_IMAGE_UPLOADED: &str = "No image uploaded";

pub const LIVENESS_MESSAGE: &str = "🦯 WalkAlong API is up.";

/// GET / - Liveness check
pub async fn liveness_handler() -> &'static str {
    LIVENESS_MESSAGE
}

/// POST /walkalong - Detect obstacles and estimate their distance
///
/// # Request
/// `multipart/form-data` with a file part named `image`.
///
/// # Response
/// - `obstacles`: `[{"label", "distance"}]`
///
/// # Errors
/// - 400 Bad Request: no `image` part, or the body is not multipart
/// - 503 Service Unavailable: walk-along models not loaded
/// - 500 Internal Server Error: decoding, inference or fusion failed
pub async fn walkalong_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<WalkAlongResponse>, ApiError> {
    let multipart = multipart.map_err(|rejection| {
        debug!("Rejected walkalong body: {}", rejection);
        ApiError::MissingField(NO_IMAGE_UPLOADED.to_string())
    })?;

    let raw = read_image_part(multipart)
        .await?
        .ok_or_else(|| ApiError::MissingField(NO_IMAGE_UPLOADED.to_string()))?;

    let pipeline = state
        .vision_model_manager
        .get_walkalong_pipeline()
        .ok_or_else(|| ApiError::ServiceUnavailable("walk-along models not loaded".to_string()))?;

    let (image, info) = decode(&raw, IngestMode::MultipartFile).map_err(|e| {
        warn!("Failed to decode upload: {}", e);
        ApiError::from(VisionError::from(e))
    })?;

    debug!(
        "Decoded upload: {}x{} {:?}, {} bytes",
        info.width, info.height, info.format, info.size_bytes
    );

    let obstacles = pipeline.run(image).await?;

    Ok(Json(WalkAlongResponse::new(obstacles)))
}

/// Returns the content of the first part named `image`, skipping others
async fn read_image_part(mut multipart: Multipart) -> Result<Option<Bytes>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to read upload: {}", e)))?;
        return Ok(Some(data));
    }
    Ok(None)
}
