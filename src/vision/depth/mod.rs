// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Depth estimation capability and its output normalization
//!
//! Components:
//! - `DepthEstimator` - capability boundary, tensor in, raw grid out
//! - `DepthAdapter` - preprocessing and output validation
//! - `onnx` - ONNX Runtime backend for Depth-Anything-V2 exports

pub mod onnx;
pub mod preprocessing;

use std::sync::Arc;

use image::RgbImage;
use ndarray::{Array4, ArrayD};
use tracing::debug;

use super::errors::VisionError;
use super::types::DepthMap;

pub use onnx::OnnxDepthModel;
pub use preprocessing::{preprocess_for_depth, ChannelOrder, DepthPreprocessConfig};

/// Depth estimation capability
#[cfg_attr(test, mockall::automock)]
pub trait DepthEstimator: Send + Sync {
    /// Run the model on a preprocessed `[1, 3, H, W]` tensor
    fn infer(&self, input: &Array4<f32>) -> Result<ArrayD<f32>, VisionError>;
}

/// Preprocesses images and turns raw model output into a `DepthMap`
#[derive(Clone)]
pub struct DepthAdapter {
    estimator: Arc<dyn DepthEstimator>,
    config: DepthPreprocessConfig,
}

impl DepthAdapter {
    pub fn new(estimator: Arc<dyn DepthEstimator>, config: DepthPreprocessConfig) -> Self {
        Self { estimator, config }
    }

    /// Estimate a depth map at the model's native resolution
    ///
    /// The grid is not resized back to the source image.
    pub fn estimate(&self, image: &RgbImage) -> Result<DepthMap, VisionError> {
        let input = preprocess_for_depth(image, &self.config);
        let raw = self.estimator.infer(&input)?;
        let depth = squeeze_depth_output(raw)?;

        debug!(
            "Depth map {}x{} for {}x{} image",
            depth.width(),
            depth.height(),
            image.width(),
            image.height()
        );

        Ok(depth)
    }
}

/// Accept `[H, W]`, `[1, H, W]` or `[1, 1, H, W]`; reject anything else
pub fn squeeze_depth_output(raw: ArrayD<f32>) -> Result<DepthMap, VisionError> {
    let shape = raw.shape().to_vec();

    let (leading, spatial) = match shape.len() {
        2..=4 => shape.split_at(shape.len() - 2),
        _ => {
            return Err(VisionError::Inference(format!(
                "depth output must be 2D, got shape {:?}",
                shape
            )))
        }
    };

    if leading.iter().any(|&d| d != 1) {
        return Err(VisionError::Inference(format!(
            "depth output must be single-channel, got shape {:?}",
            shape
        )));
    }

    if spatial.iter().any(|&d| d == 0) {
        return Err(VisionError::Inference(format!(
            "depth output is empty, got shape {:?}",
            shape
        )));
    }

    let (height, width) = (spatial[0], spatial[1]);
    let grid = raw
        .into_shape_with_order((height, width))
        .map_err(VisionError::inference)?;

    Ok(DepthMap::new(grid))
}
