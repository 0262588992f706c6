// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Depth-Anything-V2 depth model on ONNX Runtime
//!
//! The metric checkpoints output distances in meters as a `[1, H, W]` grid.

use anyhow::{Context, Result};
use ndarray::{Array4, ArrayD};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info};

use super::DepthEstimator;
use crate::vision::errors::VisionError;

/// Depth model backed by an ONNX Runtime session
#[derive(Clone)]
pub struct OnnxDepthModel {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
}

impl std::fmt::Debug for OnnxDepthModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxDepthModel")
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl OnnxDepthModel {
    /// Load the depth model from an ONNX file
    pub fn new<P: AsRef<Path>>(model_path: P, intra_threads: usize) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Depth model not found: {}", model_path.display());
        }

        info!("Loading depth model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load depth model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());

        info!("✅ Depth model loaded (input: {})", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
        })
    }

    fn run(&self, input: &Array4<f32>) -> Result<ArrayD<f32>> {
        let start = Instant::now();

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Depth session lock poisoned"))?;

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Depth inference failed")?;

        let depth = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract depth tensor")?
            .to_owned();

        debug!(
            "Depth output {:?} in {}ms",
            depth.shape(),
            start.elapsed().as_millis()
        );

        Ok(depth)
    }
}

impl DepthEstimator for OnnxDepthModel {
    fn infer(&self, input: &Array4<f32>) -> Result<ArrayD<f32>, VisionError> {
        self.run(input).map_err(|e| VisionError::inference(format!("{:#}", e)))
    }
}
