// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection-to-distance fusion
//!
//! Each detection is reduced to its box center, the center is clamped onto
//! the depth grid and the cell value becomes the obstacle distance. The
//! result is 1:1 and in input order.

use std::str::FromStr;

use super::errors::FusionError;
use super::types::{DepthMap, Detection, Obstacle};

/// How box centers are mapped onto the depth grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DepthLookupMode {
    /// Image coordinates are used directly as grid indices, then clamped
    #[default]
    Raw,
    /// Image coordinates are rescaled to the grid resolution, then clamped
    Scaled,
}

impl DepthLookupMode {
    pub fn for_image(self, image_width: u32, image_height: u32) -> DepthLookup {
        match self {
            DepthLookupMode::Raw => DepthLookup::RawIndex,
            DepthLookupMode::Scaled => DepthLookup::Scaled {
                image_width,
                image_height,
            },
        }
    }
}

impl FromStr for DepthLookupMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(DepthLookupMode::Raw),
            "scaled" => Ok(DepthLookupMode::Scaled),
            other => Err(format!("unknown depth lookup mode '{}'", other)),
        }
    }
}

/// Per-request lookup strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthLookup {
    RawIndex,
    Scaled { image_width: u32, image_height: u32 },
}

/// Fuse detections with a depth map into obstacles
///
/// An empty depth map or a non-finite sampled value aborts the whole batch;
/// no partial list is returned.
pub fn fuse(
    detections: &[Detection],
    depth: &DepthMap,
    lookup: DepthLookup,
) -> Result<Vec<Obstacle>, FusionError> {
    if depth.is_empty() {
        return Err(FusionError::EmptyDepthMap {
            width: depth.width(),
            height: depth.height(),
        });
    }

    if let DepthLookup::Scaled {
        image_width,
        image_height,
    } = lookup
    {
        if image_width == 0 || image_height == 0 {
            return Err(FusionError::InvalidImageSize {
                width: image_width,
                height: image_height,
            });
        }
    }

    let width = depth.width() as i64;
    let height = depth.height() as i64;

    detections
        .iter()
        .map(|detection| {
            let (cx, cy) = detection.bbox.center();
            let (cx, cy) = match lookup {
                DepthLookup::RawIndex => (cx, cy),
                DepthLookup::Scaled {
                    image_width,
                    image_height,
                } => (
                    (cx * width).div_euclid(image_width as i64),
                    (cy * height).div_euclid(image_height as i64),
                ),
            };

            let x = cx.clamp(0, width - 1) as usize;
            let y = cy.clamp(0, height - 1) as usize;

            // Indices are clamped to the grid above
            let raw = depth.grid()[[y, x]];
            if !raw.is_finite() {
                return Err(FusionError::NonFiniteDepth { x, y });
            }

            Ok(Obstacle {
                label: detection.label.clone(),
                distance: round_distance(raw),
            })
        })
        .collect()
}

/// Round to two decimals, half away from zero on the f64 value
pub fn round_distance(value: f32) -> f64 {
    (value as f64 * 100.0).round() / 100.0
}
