// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing module for CPU-based image analysis
//!
//! This module provides:
//! - Image ingest (base64 and multipart payloads)
//! - Object detection (currency and obstacle detectors)
//! - Depth estimation
//! - Fusion of detections with depth into obstacles

pub mod depth;
pub mod detection;
pub mod errors;
pub mod fusion;
pub mod image_utils;
pub mod model_manager;
pub mod pipeline;
pub mod types;
pub mod weights;

pub use depth::{DepthAdapter, DepthEstimator};
pub use detection::{DetectionAdapter, ObjectDetector};
pub use errors::{FusionError, VisionError};
pub use fusion::{fuse, round_distance, DepthLookup, DepthLookupMode};
pub use image_utils::{
    decode, decode_base64_image, decode_image_bytes, ImageError, ImageInfo, IngestMode,
    MAX_IMAGE_SIZE,
};
pub use model_manager::{VisionModelConfig, VisionModelInfo, VisionModelManager};
pub use pipeline::{CurrencyPipeline, WalkAlongPipeline};
pub use types::{BoundingBox, DepthMap, Detection, Obstacle, RawDetection};
