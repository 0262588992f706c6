// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Currency detection endpoint handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use tracing::{debug, warn};

use super::request::DetectRequest;
use super::response::DetectResponse;
use crate::api::errors::ApiError;
use crate::api::http_server::AppState;
use crate::vision::{decode_base64_image, VisionError};

/// POST /detect - Recognize banknotes and coins
///
/// # Request
/// - `image`: Base64-encoded image data (required)
///
/// # Response
/// - `detections`: `[{"class", "confidence", "bbox": [x1, y1, x2, y2]}]`
///
/// # Errors
/// - 400 Bad Request: `image` key absent
/// - 503 Service Unavailable: currency model not loaded
/// - 500 Internal Server Error: body is not JSON, `image` is not a string,
///   or decoding or inference failed
pub async fn detect_handler(
    State(state): State<AppState>,
    payload: Result<Json<DetectRequest>, JsonRejection>,
) -> Result<Json<DetectResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected detect body: {}", rejection.body_text());
        ApiError::from(VisionError::Unhandled(format!(
            "Invalid JSON body: {}",
            rejection.body_text()
        )))
    })?;

    let image_data = request.into_image()?;

    let pipeline = state
        .vision_model_manager
        .get_currency_pipeline()
        .ok_or_else(|| ApiError::ServiceUnavailable("currency model not loaded".to_string()))?;

    let (image, info) = decode_base64_image(&image_data).map_err(|e| {
        warn!("Failed to decode image: {}", e);
        ApiError::from(VisionError::from(e))
    })?;

    debug!(
        "Decoded image: {}x{}, {} bytes",
        info.width, info.height, info.size_bytes
    );

    let detections = pipeline.run(image).await?;

    Ok(Json(DetectResponse::new(detections)))
}
