// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request pipelines for the currency and walk-along services
//!
//! Inference is CPU-bound, so every model call runs on tokio's blocking
//! pool. The walk-along pipeline issues detection and depth estimation
//! concurrently over a shared read-only image.

use std::sync::Arc;
use std::time::Instant;

use image::RgbImage;
use tracing::{debug, info};

use super::depth::DepthAdapter;
use super::detection::DetectionAdapter;
use super::errors::VisionError;
use super::fusion::{fuse, DepthLookupMode};
use super::types::{Detection, Obstacle};

/// Currency recognition: detection only
#[derive(Clone)]
pub struct CurrencyPipeline {
    detector: DetectionAdapter,
}

impl CurrencyPipeline {
    pub fn new(detector: DetectionAdapter) -> Self {
        Self { detector }
    }

    pub async fn run(&self, image: RgbImage) -> Result<Vec<Detection>, VisionError> {
        let start = Instant::now();
        let detector = self.detector.clone();

        let detections = tokio::task::spawn_blocking(move || detector.detect(&image)).await??;

        info!(
            "Currency detection complete: {} detections, {}ms",
            detections.len(),
            start.elapsed().as_millis()
        );

        Ok(detections)
    }
}

/// Walk-along: detection fused with depth
#[derive(Clone)]
pub struct WalkAlongPipeline {
    detector: DetectionAdapter,
    depth: DepthAdapter,
    lookup: DepthLookupMode,
}

impl WalkAlongPipeline {
    pub fn new(detector: DetectionAdapter, depth: DepthAdapter, lookup: DepthLookupMode) -> Self {
        Self {
            detector,
            depth,
            lookup,
        }
    }

    pub fn lookup_mode(&self) -> DepthLookupMode {
        self.lookup
    }

    /// Detect obstacles and attach a distance to each
    ///
    /// Fails as a whole if either model or the fusion step fails.
    pub async fn run(&self, image: RgbImage) -> Result<Vec<Obstacle>, VisionError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();
        let image = Arc::new(image);

        let detect_task = {
            let detector = self.detector.clone();
            let image = Arc::clone(&image);
            tokio::task::spawn_blocking(move || detector.detect(&image))
        };
        let depth_task = {
            let depth = self.depth.clone();
            let image = Arc::clone(&image);
            tokio::task::spawn_blocking(move || depth.estimate(&image))
        };

        let (detections, depth) = tokio::try_join!(detect_task, depth_task)?;
        let (detections, depth) = (detections?, depth?);

        debug!(
            "Fusing {} detections with {}x{} depth map",
            detections.len(),
            depth.width(),
            depth.height()
        );

        let obstacles = fuse(&detections, &depth, self.lookup.for_image(width, height))?;

        info!(
            "Walk-along complete: {} obstacles, {}ms",
            obstacles.len(),
            start.elapsed().as_millis()
        );

        Ok(obstacles)
    }
}
