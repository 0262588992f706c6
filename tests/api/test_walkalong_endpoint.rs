// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Walk-along endpoint tests for GET / and POST /walkalong
//!
//! Detector and depth estimator are mocked; depth grids are returned at
//! their own resolution so lookups can be checked cell by cell.

use axum::{body::Body, http::Request, http::StatusCode};
use serde_json::json;
use walkalong_node::{
    api::{build_router, AppState, LIVENESS_MESSAGE},
    config::ServiceKind,
    vision::VisionError,
};

use crate::common::*;

fn walkalong_router(detector: MockDetector, depth: MockDepth) -> axum::Router {
    build_router(
        AppState::new(walkalong_manager(detector, depth)),
        ServiceKind::Walkalong,
    )
}

fn upload(data: &[u8]) -> Request<Body> {
    multipart_request("/walkalong", multipart_body("image", "frame.png", data))
}

#[cfg(test)]
mod liveness_tests {
    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let router = walkalong_router(MockDetector::new(), MockDepth::new());
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let (status, body) = send(router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(String::from_utf8(body).unwrap(), "🦯 WalkAlong API is up.");
        assert_eq!(LIVENESS_MESSAGE, "🦯 WalkAlong API is up.");
    }
}

#[cfg(test)]
mod walkalong_handler_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_image_part_returns_400() {
        let mut detector = MockDetector::new();
        detector.expect_infer().times(0);
        let mut depth = MockDepth::new();
        depth.expect_infer().times(0);

        let request = multipart_request(
            "/walkalong",
            multipart_body("file", "frame.png", &png_bytes(8, 8)),
        );
        let (status, body) = send_json(walkalong_router(detector, depth), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No image uploaded"}));
    }

    #[tokio::test]
    async fn test_non_multipart_body_returns_400() {
        let router = walkalong_router(MockDetector::new(), MockDepth::new());

        let request = json_request("/walkalong", json!({"image": "abc"}).to_string());
        let (status, body) = send_json(router, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "No image uploaded"}));
    }

    #[tokio::test]
    async fn test_no_detections_returns_empty_obstacles() {
        let detector = coco_detector(vec![]);
        let depth = depth_returning(uniform_grid(64, 64, 2.0));

        let (status, body) = send_json(walkalong_router(detector, depth), upload(&png_bytes(64, 64))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"obstacles": []}));
    }

    #[tokio::test]
    async fn test_distance_is_depth_at_box_center() {
        let detector = coco_detector(vec![raw(10.0, 10.0, 30.0, 30.0, 0.9, 0)]);
        let mut grid = uniform_grid(64, 64, 1.0);
        grid[[0, 20, 20]] = 3.456;
        let depth = depth_returning(grid);

        let (status, body) = send_json(walkalong_router(detector, depth), upload(&png_bytes(64, 64))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"obstacles": [{"label": "person", "distance": 3.46}]}));
    }

    #[tokio::test]
    async fn test_nan_depth_at_center_returns_500() {
        let detector = coco_detector(vec![raw(10.0, 10.0, 30.0, 30.0, 0.9, 0)]);
        let mut grid = uniform_grid(64, 64, 1.0);
        grid[[0, 20, 20]] = f32::NAN;
        let depth = depth_returning(grid);

        let (status, body) = send_json(walkalong_router(detector, depth), upload(&png_bytes(64, 64))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("obstacles").is_none());
        assert_eq!(
            body,
            json!({"error": "Fusion failed: Non-finite depth value at (20, 20)"})
        );
    }

    #[tokio::test]
    async fn test_center_outside_grid_is_clamped() {
        // Center (62, 62) falls outside a 32x32 grid and clamps to (31, 31)
        let detector = coco_detector(vec![raw(60.0, 60.0, 64.0, 64.0, 0.6, 56)]);
        let mut grid = uniform_grid(32, 32, 1.0);
        grid[[0, 31, 31]] = 7.0;
        let depth = depth_returning(grid);

        let (status, body) = send_json(walkalong_router(detector, depth), upload(&png_bytes(64, 64))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"obstacles": [{"label": "chair", "distance": 7.0}]}));
    }

    #[tokio::test]
    async fn test_obstacles_keep_detection_order() {
        let detector = coco_detector(vec![
            raw(0.0, 0.0, 4.0, 4.0, 0.9, 2),
            raw(4.0, 4.0, 8.0, 8.0, 0.8, 0),
        ]);
        let mut grid = uniform_grid(16, 16, 0.0);
        grid[[0, 2, 2]] = 1.5;
        grid[[0, 6, 6]] = 4.25;
        let depth = depth_returning(grid);

        let (status, body) = send_json(walkalong_router(detector, depth), upload(&png_bytes(16, 16))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"obstacles": [
                {"label": "car", "distance": 1.5},
                {"label": "person", "distance": 4.25}
            ]})
        );
    }

    #[tokio::test]
    async fn test_undecodable_upload_returns_500() {
        let mut detector = MockDetector::new();
        detector.expect_infer().times(0);
        let mut depth = MockDepth::new();
        depth.expect_infer().times(0);

        let (status, body) =
            send_json(walkalong_router(detector, depth), upload(b"definitely not an image")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_depth_failure_returns_500_without_obstacles() {
        let detector = coco_detector(vec![raw(10.0, 10.0, 30.0, 30.0, 0.9, 0)]);
        let mut depth = MockDepth::new();
        depth
            .expect_infer()
            .returning(|_| Err(VisionError::Inference("depth session failed".to_string())));

        let (status, body) = send_json(walkalong_router(detector, depth), upload(&png_bytes(64, 64))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("obstacles").is_none());
        assert_eq!(body, json!({"error": "Inference failed: depth session failed"}));
    }

    #[tokio::test]
    async fn test_empty_depth_output_returns_500() {
        let detector = coco_detector(vec![raw(10.0, 10.0, 30.0, 30.0, 0.9, 0)]);
        let depth = depth_returning(uniform_grid(0, 0, 0.0));

        let (status, body) = send_json(walkalong_router(detector, depth), upload(&png_bytes(64, 64))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("obstacles").is_none());
    }

    #[tokio::test]
    async fn test_walkalong_service_has_no_detect_route() {
        let router = walkalong_router(MockDetector::new(), MockDepth::new());

        let request = json_request("/detect", json!({"image": png_base64(8, 8)}).to_string());
        let (status, _) = send(router, request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
