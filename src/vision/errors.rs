// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use thiserror::Error;

use super::image_utils::ImageError;

/// Invalid inputs to detection/depth fusion
#[derive(Debug, Error, PartialEq)]
pub enum FusionError {
    #[error("Depth map is empty: {width}x{height}")]
    EmptyDepthMap { width: usize, height: usize },

    #[error("Invalid image size for scaled depth lookup: {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },

    #[error("Non-finite depth value at ({x}, {y})")]
    NonFiniteDepth { x: usize, y: usize },
}

/// Failures surfaced by the vision pipeline
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("{0}")]
    Decode(#[from] ImageError),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Fusion failed: {0}")]
    Fusion(#[from] FusionError),

    #[error("{0}")]
    Unhandled(String),
}

impl VisionError {
    pub fn inference(err: impl std::fmt::Display) -> Self {
        VisionError::Inference(err.to_string())
    }
}

impl From<tokio::task::JoinError> for VisionError {
    fn from(err: tokio::task::JoinError) -> Self {
        VisionError::Unhandled(format!("Inference task aborted: {}", err))
    }
}
