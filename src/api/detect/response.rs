// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Currency detection response types

use serde::{Deserialize, Serialize};

use crate::vision::Detection;

/// A detected banknote or coin
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionItem {
    /// Denomination label
    #[serde(rename = "class")]
    pub class_name: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// `[x1, y1, x2, y2]` in image pixels
    pub bbox: [i32; 4],
}

impl From<Detection> for DetectionItem {
    fn from(detection: Detection) -> Self {
        Self {
            class_name: detection.label,
            confidence: detection.confidence,
            bbox: detection.bbox.as_array(),
        }
    }
}

/// Body of a successful `POST /detect`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectResponse {
    pub detections: Vec<DetectionItem>,
}

impl DetectResponse {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections: detections.into_iter().map(DetectionItem::from).collect(),
        }
    }
}
