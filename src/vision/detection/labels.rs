// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Class label tables for the detection models

use std::path::Path;

use anyhow::{Context, Result};

/// Classes of the Indian currency detector, in model output order
pub const CURRENCY_CLASS_NAMES: &[&str] = &[
    "1 rupee",
    "1 rupee coin",
    "10 rupee coin",
    "10 rupees",
    "100 rupees",
    "2 rupee",
    "2 rupee coin",
    "20 rupee coin",
    "20 rupees",
    "200 rupees",
    "2000 rupees",
    "5 rupee",
    "5 rupee coin",
    "50 rupees",
    "500 rupees",
];

/// COCO classes used by the stock obstacle detector
pub const COCO_CLASS_NAMES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Ordered class id -> label mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTable {
    names: Vec<String>,
}

impl LabelTable {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn from_static(names: &[&str]) -> Self {
        Self::new(names.iter().map(|s| s.to_string()).collect())
    }

    pub fn currency() -> Self {
        Self::from_static(CURRENCY_CLASS_NAMES)
    }

    pub fn coco() -> Self {
        Self::from_static(COCO_CLASS_NAMES)
    }

    /// Load a labels file with one class name per line
    ///
    /// Blank lines are skipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read labels file {}", path.display()))?;

        let names: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if names.is_empty() {
            anyhow::bail!("Labels file {} has no entries", path.display());
        }

        Ok(Self::new(names))
    }

    pub fn get(&self, class_id: usize) -> Option<&str> {
        self.names.get(class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
