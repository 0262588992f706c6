// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request-scoped values exchanged between the vision stages

use ndarray::Array2;

/// Axis-aligned box in original image pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Center point using floor division, matching integer pixel semantics
    pub fn center(&self) -> (i64, i64) {
        let cx = (self.x1 as i64 + self.x2 as i64).div_euclid(2);
        let cy = (self.y1 as i64 + self.y2 as i64).div_euclid(2);
        (cx, cy)
    }

    pub fn is_degenerate(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    pub fn as_array(&self) -> [i32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Raw element produced by a detection capability
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDetection {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
    pub class_id: usize,
}

/// A labelled detection, normalized by the detection adapter
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Dense distance grid, indexed `[row, col]` = `[y, x]`
///
/// The grid keeps the depth model's native resolution, which may differ
/// from the source image.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    grid: Array2<f32>,
}

impl DepthMap {
    pub fn new(grid: Array2<f32>) -> Self {
        Self { grid }
    }

    /// Build from row-major values; `None` when the length does not match
    pub fn from_shape_vec(width: usize, height: usize, values: Vec<f32>) -> Option<Self> {
        Array2::from_shape_vec((height, width), values)
            .ok()
            .map(Self::new)
    }

    pub fn width(&self) -> usize {
        self.grid.ncols()
    }

    pub fn height(&self) -> usize {
        self.grid.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        self.grid.get((y, x)).copied()
    }

    pub fn grid(&self) -> &Array2<f32> {
        &self.grid
    }
}

/// A detection paired with an estimated distance
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub label: String,
    /// Distance rounded to two decimals
    pub distance: f64,
}
