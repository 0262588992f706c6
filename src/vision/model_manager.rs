// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision model manager for resolving, loading and sharing the models

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use super::depth::{DepthAdapter, DepthPreprocessConfig, OnnxDepthModel};
use super::detection::{DetectionAdapter, LabelTable, YoloConfig, YoloDetector};
use super::fusion::DepthLookupMode;
use super::pipeline::{CurrencyPipeline, WalkAlongPipeline};
use super::weights::{ensure_weights, WeightSource};

/// Detector weights plus the label set they were trained on
#[derive(Debug, Clone)]
pub struct DetectorModelConfig {
    pub weights: WeightSource,
    /// Labels file; falls back to `default_labels` when unset
    pub labels_path: Option<PathBuf>,
    pub default_labels: LabelTable,
    pub yolo: YoloConfig,
}

impl DetectorModelConfig {
    fn label_table(&self) -> Result<LabelTable> {
        match self.labels_path {
            Some(ref path) => LabelTable::from_file(path),
            None => Ok(self.default_labels.clone()),
        }
    }
}

/// Walk-along model set
#[derive(Debug, Clone)]
pub struct WalkAlongModelConfig {
    pub detector: DetectorModelConfig,
    pub depth_weights: WeightSource,
    pub depth_preprocess: DepthPreprocessConfig,
    pub lookup: DepthLookupMode,
    pub intra_threads: usize,
}

/// Configuration for loading vision models
///
/// A `None` service is not loaded at all.
#[derive(Debug, Clone, Default)]
pub struct VisionModelConfig {
    pub currency: Option<DetectorModelConfig>,
    pub walkalong: Option<WalkAlongModelConfig>,
}

/// Information about a loaded vision model
#[derive(Debug, Clone)]
pub struct VisionModelInfo {
    /// Model name
    pub name: String,
    /// Model type (detection, depth)
    pub model_type: String,
    /// Whether the model is available
    pub available: bool,
}

/// Owner of the process-wide, read-only model handles
///
/// Built once at startup and shared with request handlers through the
/// router state.
pub struct VisionModelManager {
    currency: Option<Arc<CurrencyPipeline>>,
    walkalong: Option<Arc<WalkAlongPipeline>>,
}

impl VisionModelManager {
    /// Resolve weights (downloading if needed) and load every configured model
    ///
    /// A configured service whose model cannot be loaded is a startup error.
    pub async fn new(config: VisionModelConfig) -> Result<Self> {
        let currency = match config.currency {
            Some(ref detector) => {
                let adapter = load_detector(detector).await?;
                tracing::info!("✅ Currency detector ready");
                Some(Arc::new(CurrencyPipeline::new(adapter)))
            }
            None => None,
        };

        let walkalong = match config.walkalong {
            Some(ref walk) => {
                let detector = load_detector(&walk.detector).await?;

                let depth_path = ensure_weights(&walk.depth_weights).await?;
                let intra_threads = walk.intra_threads;
                let depth_model = tokio::task::spawn_blocking(move || {
                    OnnxDepthModel::new(depth_path, intra_threads)
                })
                .await??;
                let depth = DepthAdapter::new(Arc::new(depth_model), walk.depth_preprocess);

                tracing::info!("✅ Walk-along models ready (lookup: {:?})", walk.lookup);
                Some(Arc::new(WalkAlongPipeline::new(detector, depth, walk.lookup)))
            }
            None => None,
        };

        Ok(Self::from_pipelines(currency, walkalong))
    }

    /// Assemble a manager from already-built pipelines (tests, embedding)
    pub fn from_pipelines(
        currency: Option<Arc<CurrencyPipeline>>,
        walkalong: Option<Arc<WalkAlongPipeline>>,
    ) -> Self {
        Self {
            currency,
            walkalong,
        }
    }

    pub fn get_currency_pipeline(&self) -> Option<Arc<CurrencyPipeline>> {
        self.currency.clone()
    }

    pub fn get_walkalong_pipeline(&self) -> Option<Arc<WalkAlongPipeline>> {
        self.walkalong.clone()
    }

    /// List all vision models and whether they are loaded
    pub fn list_models(&self) -> Vec<VisionModelInfo> {
        vec![
            VisionModelInfo {
                name: "currency-detector".to_string(),
                model_type: "detection".to_string(),
                available: self.currency.is_some(),
            },
            VisionModelInfo {
                name: "obstacle-detector".to_string(),
                model_type: "detection".to_string(),
                available: self.walkalong.is_some(),
            },
            VisionModelInfo {
                name: "depth-anything-v2".to_string(),
                model_type: "depth".to_string(),
                available: self.walkalong.is_some(),
            },
        ]
    }
}

async fn load_detector(config: &DetectorModelConfig) -> Result<DetectionAdapter> {
    let path = ensure_weights(&config.weights).await?;
    let labels = config.label_table()?;
    let yolo = config.yolo.clone();

    let detector =
        tokio::task::spawn_blocking(move || YoloDetector::new(path, labels, yolo)).await??;

    Ok(DetectionAdapter::new(Arc::new(detector)))
}
