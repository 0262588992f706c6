// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! YOLOv8 object detector on ONNX Runtime
//!
//! Expects an Ultralytics ONNX export with a single `[1, 3, S, S]` input and
//! a `[1, 4 + nc, N]` output head. Runs on CPU.

use anyhow::{Context, Result};
use image::RgbImage;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info};

use super::labels::LabelTable;
use super::postprocess::{decode_predictions, letterbox, non_max_suppression};
use super::ObjectDetector;
use crate::vision::errors::VisionError;
use crate::vision::types::RawDetection;

/// Default square input size of Ultralytics exports
pub const YOLO_INPUT_SIZE: u32 = 640;

/// Detector tuning, defaults follow Ultralytics `predict`
#[derive(Debug, Clone)]
pub struct YoloConfig {
    pub input_size: u32,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    pub intra_threads: usize,
}

impl Default for YoloConfig {
    fn default() -> Self {
        Self {
            input_size: YOLO_INPUT_SIZE,
            confidence_threshold: 0.25,
            iou_threshold: 0.7,
            max_detections: 300,
            intra_threads: 4,
        }
    }
}

/// YOLOv8 detector backed by an ONNX Runtime session
#[derive(Clone)]
pub struct YoloDetector {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    labels: LabelTable,
    config: YoloConfig,
}

impl std::fmt::Debug for YoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetector")
            .field("input_name", &self.input_name)
            .field("classes", &self.labels.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl YoloDetector {
    /// Load the detector from an ONNX file
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file not found
    /// - ONNX Runtime initialization fails
    pub fn new<P: AsRef<Path>>(model_path: P, labels: LabelTable, config: YoloConfig) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Detection model not found: {}", model_path.display());
        }

        if labels.is_empty() {
            anyhow::bail!("Detection model needs at least one class label");
        }

        info!("Loading detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(config.intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load detection model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "images".to_string());

        if let Some(input) = session.inputs.first() {
            debug!("Detection model input: {} {:?}", input.name, input.input_type);
        }

        info!(
            "✅ Detection model loaded ({} classes, input {}px)",
            labels.len(),
            config.input_size
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            labels,
            config,
        })
    }

    fn run(&self, image: &RgbImage) -> Result<Vec<RawDetection>> {
        let start = Instant::now();
        let (input, geometry) = letterbox(image, self.config.input_size);

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Detection session lock poisoned"))?;

        let input_value = Value::from_array(input).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        debug!("Detection output shape: {:?}", output_tensor.shape());

        let candidates =
            decode_predictions(output_tensor.view(), &geometry, self.config.confidence_threshold)?;
        let detections = non_max_suppression(
            candidates,
            self.config.iou_threshold,
            self.config.max_detections,
        );

        debug!(
            "Detected {} objects in {}ms",
            detections.len(),
            start.elapsed().as_millis()
        );

        Ok(detections)
    }
}

impl ObjectDetector for YoloDetector {
    fn infer(&self, image: &RgbImage) -> Result<Vec<RawDetection>, VisionError> {
        self.run(image).map_err(|e| VisionError::inference(format!("{:#}", e)))
    }

    fn class_name(&self, class_id: usize) -> Option<String> {
        self.labels.get(class_id).map(str::to_string)
    }
}
