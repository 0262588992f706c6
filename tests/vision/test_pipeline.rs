// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Pipeline tests: concurrency of the walk-along models, lookup modes and
//! error propagation.

use std::time::{Duration, Instant};

use image::RgbImage;
use ndarray::Array3;
use walkalong_node::vision::{DepthLookupMode, VisionError};

use crate::common::*;

const MODEL_DELAY: Duration = Duration::from_millis(300);

#[cfg(test)]
mod walkalong_pipeline_tests {
    use super::*;

    #[tokio::test]
    async fn test_detection_and_depth_run_concurrently() {
        let mut detector = MockDetector::new();
        detector.expect_infer().times(1).returning(|_| {
            std::thread::sleep(MODEL_DELAY);
            Ok(vec![raw(0.0, 0.0, 8.0, 8.0, 0.9, 0)])
        });
        detector
            .expect_class_name()
            .returning(|_| Some("person".to_string()));

        let mut depth = MockDepth::new();
        depth.expect_infer().times(1).returning(|_| {
            std::thread::sleep(MODEL_DELAY);
            Ok(uniform_grid(16, 16, 2.0).into_dyn())
        });

        let pipeline = walkalong_pipeline(detector, depth, DepthLookupMode::Raw);
        let start = Instant::now();
        let obstacles = pipeline.run(RgbImage::new(16, 16)).await.unwrap();
        let elapsed = start.elapsed();

        assert_eq!(obstacles.len(), 1);
        assert_eq!(obstacles[0].distance, 2.0);
        assert!(
            elapsed < MODEL_DELAY * 2 - Duration::from_millis(50),
            "models ran sequentially: {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_raw_lookup_clamps_large_images() {
        // Center (50, 50) on a 10x10 grid clamps to (9, 9)
        let detector = coco_detector(vec![raw(40.0, 40.0, 60.0, 60.0, 0.9, 0)]);
        let depth = depth_returning(indexed_grid(10, 10));

        let pipeline = walkalong_pipeline(detector, depth, DepthLookupMode::Raw);
        let obstacles = pipeline.run(RgbImage::new(100, 100)).await.unwrap();

        assert_eq!(obstacles[0].distance, 99.0);
    }

    #[tokio::test]
    async fn test_scaled_lookup_maps_center_to_grid() {
        // Center (50, 50) in a 100x100 image maps to cell (5, 5)
        let detector = coco_detector(vec![raw(40.0, 40.0, 60.0, 60.0, 0.9, 0)]);
        let depth = depth_returning(indexed_grid(10, 10));

        let pipeline = walkalong_pipeline(detector, depth, DepthLookupMode::Scaled);
        assert_eq!(pipeline.lookup_mode(), DepthLookupMode::Scaled);
        let obstacles = pipeline.run(RgbImage::new(100, 100)).await.unwrap();

        assert_eq!(obstacles[0].distance, 55.0);
    }

    #[tokio::test]
    async fn test_detector_failure_fails_request() {
        let mut detector = MockDetector::new();
        detector
            .expect_infer()
            .returning(|_| Err(VisionError::Inference("detector down".to_string())));
        let depth = depth_returning(uniform_grid(8, 8, 1.0));

        let pipeline = walkalong_pipeline(detector, depth, DepthLookupMode::Raw);
        let err = pipeline.run(RgbImage::new(8, 8)).await.unwrap_err();

        assert!(matches!(err, VisionError::Inference(_)));
    }

    #[tokio::test]
    async fn test_unknown_class_fails_request() {
        let detector = coco_detector(vec![raw(0.0, 0.0, 4.0, 4.0, 0.9, 80)]);
        let depth = depth_returning(uniform_grid(8, 8, 1.0));

        let pipeline = walkalong_pipeline(detector, depth, DepthLookupMode::Raw);
        let err = pipeline.run(RgbImage::new(8, 8)).await.unwrap_err();

        assert!(err.to_string().contains("unknown class id 80"));
    }

    #[tokio::test]
    async fn test_multi_channel_depth_output_is_rejected() {
        let detector = coco_detector(vec![raw(0.0, 0.0, 4.0, 4.0, 0.9, 0)]);
        let depth = depth_returning(Array3::from_elem((3, 8, 8), 1.0));

        let pipeline = walkalong_pipeline(detector, depth, DepthLookupMode::Raw);
        let err = pipeline.run(RgbImage::new(8, 8)).await.unwrap_err();

        assert!(err.to_string().contains("single-channel"));
    }
}

#[cfg(test)]
mod currency_pipeline_tests {
    use super::*;

    #[tokio::test]
    async fn test_degenerate_boxes_are_dropped() {
        let detector = currency_detector(vec![
            raw(5.0, 5.0, 5.5, 20.0, 0.9, 0),
            raw(1.0, 1.0, 10.0, 10.0, 0.8, 1),
        ]);

        let detections = currency_pipeline(detector)
            .run(RgbImage::new(32, 32))
            .await
            .unwrap();

        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].bbox.as_array(), [1, 1, 10, 10]);
    }

    #[tokio::test]
    async fn test_boxes_are_clamped_to_image() {
        let detector = currency_detector(vec![raw(-4.0, -2.0, 40.0, 50.0, 0.7, 3)]);

        let detections = currency_pipeline(detector)
            .run(RgbImage::new(32, 24))
            .await
            .unwrap();

        assert_eq!(detections[0].bbox.as_array(), [0, 0, 32, 24]);
    }
}

/// `[1, H, W]` grid where cell (x, y) holds `x + 10 * y`
fn indexed_grid(width: usize, height: usize) -> Array3<f32> {
    Array3::from_shape_fn((1, height, width), |(_, y, x)| (x + 10 * y) as f32)
}
