// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fixtures: capability mocks, image payloads and router helpers

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat, RgbImage};
use mockall::mock;
use ndarray::{Array3, Array4, ArrayD};
use tower::ServiceExt;
use walkalong_node::vision::{
    depth::DepthPreprocessConfig,
    detection::{COCO_CLASS_NAMES, CURRENCY_CLASS_NAMES},
    CurrencyPipeline, DepthAdapter, DepthEstimator, DepthLookupMode, DetectionAdapter,
    ObjectDetector, RawDetection, VisionError, VisionModelManager, WalkAlongPipeline,
};

mock! {
    pub Detector {}

    impl ObjectDetector for Detector {
        fn infer(&self, image: &RgbImage) -> Result<Vec<RawDetection>, VisionError>;
        fn class_name(&self, class_id: usize) -> Option<String>;
    }
}

mock! {
    pub Depth {}

    impl DepthEstimator for Depth {
        fn infer(&self, input: &Array4<f32>) -> Result<ArrayD<f32>, VisionError>;
    }
}

pub const MULTIPART_BOUNDARY: &str = "walkalong-test-boundary";

/// Detector mock that returns `detections` once per call, labelled from `names`
pub fn detector_returning(detections: Vec<RawDetection>, names: &'static [&'static str]) -> MockDetector {
    let mut detector = MockDetector::new();
    detector
        .expect_infer()
        .returning(move |_| Ok(detections.clone()));
    detector
        .expect_class_name()
        .returning(move |id| names.get(id).map(|s| s.to_string()));
    detector
}

pub fn coco_detector(detections: Vec<RawDetection>) -> MockDetector {
    detector_returning(detections, COCO_CLASS_NAMES)
}

pub fn currency_detector(detections: Vec<RawDetection>) -> MockDetector {
    detector_returning(detections, CURRENCY_CLASS_NAMES)
}

/// Depth mock returning `grid` on every call
pub fn depth_returning(grid: Array3<f32>) -> MockDepth {
    let mut depth = MockDepth::new();
    depth
        .expect_infer()
        .returning(move |_| Ok(grid.clone().into_dyn()));
    depth
}

pub fn uniform_grid(width: usize, height: usize, fill: f32) -> Array3<f32> {
    Array3::from_elem((1, height, width), fill)
}

pub fn raw(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32, class_id: usize) -> RawDetection {
    RawDetection {
        x1,
        y1,
        x2,
        y2,
        confidence,
        class_id,
    }
}

pub fn currency_pipeline(detector: MockDetector) -> CurrencyPipeline {
    CurrencyPipeline::new(DetectionAdapter::new(Arc::new(detector)))
}

pub fn walkalong_pipeline(
    detector: MockDetector,
    depth: MockDepth,
    lookup: DepthLookupMode,
) -> WalkAlongPipeline {
    WalkAlongPipeline::new(
        DetectionAdapter::new(Arc::new(detector)),
        DepthAdapter::new(Arc::new(depth), DepthPreprocessConfig::default()),
        lookup,
    )
}

pub fn currency_manager(detector: MockDetector) -> Arc<VisionModelManager> {
    Arc::new(VisionModelManager::from_pipelines(
        Some(Arc::new(currency_pipeline(detector))),
        None,
    ))
}

pub fn walkalong_manager(detector: MockDetector, depth: MockDepth) -> Arc<VisionModelManager> {
    Arc::new(VisionModelManager::from_pipelines(
        None,
        Some(Arc::new(walkalong_pipeline(detector, depth, DepthLookupMode::Raw))),
    ))
}

/// Encode a solid gray `width` x `height` PNG
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, image::Rgb([128, 128, 128]));
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

pub fn png_base64(width: u32, height: u32) -> String {
    STANDARD.encode(png_bytes(width, height))
}

/// `multipart/form-data` body with a single file part
pub fn multipart_body(field: &str, filename: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn json_request(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Send one request through the router and return status plus raw body
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

pub async fn send_json(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, body) = send(router, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}
