// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Object detection capability and its output normalization
//!
//! Components:
//! - `ObjectDetector` - capability boundary, one inference per call
//! - `DetectionAdapter` - turns raw boxes into labelled `Detection`s
//! - `yolo` - ONNX Runtime backend for YOLOv8-style exports
//! - `labels` - label tables shipped with the service

pub mod labels;
pub mod postprocess;
pub mod yolo;

use std::sync::Arc;

use image::RgbImage;
use tracing::debug;

use super::errors::VisionError;
use super::types::{BoundingBox, Detection, RawDetection};

pub use labels::{LabelTable, COCO_CLASS_NAMES, CURRENCY_CLASS_NAMES};
pub use yolo::{YoloConfig, YoloDetector};

/// Object detection capability
///
/// Implementations return boxes in original-image pixel coordinates and own
/// their class taxonomy.
#[cfg_attr(test, mockall::automock)]
pub trait ObjectDetector: Send + Sync {
    /// Run detection once on an RGB image
    fn infer(&self, image: &RgbImage) -> Result<Vec<RawDetection>, VisionError>;

    /// Resolve a class id to its label
    fn class_name(&self, class_id: usize) -> Option<String>;
}

/// Normalizes detector output into `Detection`s
#[derive(Clone)]
pub struct DetectionAdapter {
    detector: Arc<dyn ObjectDetector>,
}

impl DetectionAdapter {
    pub fn new(detector: Arc<dyn ObjectDetector>) -> Self {
        Self { detector }
    }

    /// Detect objects in `image`
    ///
    /// Coordinates are truncated toward zero and clamped to the image; boxes
    /// that collapse (`x2 <= x1` or `y2 <= y1`) are dropped. An unknown class
    /// id fails the whole call.
    pub fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, VisionError> {
        let raw = self.detector.infer(image)?;
        let (width, height) = image.dimensions();

        let mut detections = Vec::with_capacity(raw.len());
        for element in raw {
            let bbox = truncate_box(&element, width, height);
            if bbox.is_degenerate() {
                debug!("Dropping degenerate box {:?}", element);
                continue;
            }

            let label = self.detector.class_name(element.class_id).ok_or_else(|| {
                VisionError::Inference(format!("unknown class id {}", element.class_id))
            })?;

            detections.push(Detection {
                label,
                confidence: normalize_confidence(element.confidence),
                bbox,
            });
        }

        Ok(detections)
    }
}

fn truncate_box(raw: &RawDetection, width: u32, height: u32) -> BoundingBox {
    let max_x = width.min(i32::MAX as u32) as i32;
    let max_y = height.min(i32::MAX as u32) as i32;
    // `as` truncates toward zero and saturates; NaN becomes 0
    BoundingBox::new(
        (raw.x1 as i32).clamp(0, max_x),
        (raw.y1 as i32).clamp(0, max_y),
        (raw.x2 as i32).clamp(0, max_x),
        (raw.y2 as i32).clamp(0, max_y),
    )
}

fn normalize_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
