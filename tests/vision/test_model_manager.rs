// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Vision model manager tests
//!
//! Verifies that the VisionModelManager:
//! - Loads only the configured services
//! - Fails startup when configured weights cannot be resolved
//! - Reports model availability

use std::sync::Arc;

use walkalong_node::vision::{
    depth::DepthPreprocessConfig,
    detection::{LabelTable, YoloConfig},
    model_manager::{DetectorModelConfig, WalkAlongModelConfig},
    weights::WeightSource,
    DepthLookupMode, VisionModelConfig, VisionModelManager,
};

use crate::common::*;

fn detector_config(dir: &std::path::Path, labels: LabelTable) -> DetectorModelConfig {
    DetectorModelConfig {
        weights: WeightSource::new(dir.join("detector.onnx"), None),
        labels_path: None,
        default_labels: labels,
        yolo: YoloConfig::default(),
    }
}

#[cfg(test)]
mod model_manager_tests {
    use super::*;

    #[tokio::test]
    async fn test_no_services_configured() {
        let manager = VisionModelManager::new(VisionModelConfig::default())
            .await
            .unwrap();

        assert!(manager.get_currency_pipeline().is_none());
        assert!(manager.get_walkalong_pipeline().is_none());
    }

    #[tokio::test]
    async fn test_missing_walkalong_weights_fail_startup() {
        let dir = tempfile::tempdir().unwrap();
        let config = VisionModelConfig {
            currency: None,
            walkalong: Some(WalkAlongModelConfig {
                detector: detector_config(dir.path(), LabelTable::coco()),
                depth_weights: WeightSource::new(dir.path().join("depth.onnx"), None),
                depth_preprocess: DepthPreprocessConfig::default(),
                lookup: DepthLookupMode::Raw,
                intra_threads: 1,
            }),
        };

        let err = VisionModelManager::new(config).await.err().unwrap();
        assert!(err.to_string().contains("detector.onnx"));
    }

    #[tokio::test]
    async fn test_invalid_labels_file_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("detector.onnx"), b"not a model").unwrap();
        let labels = dir.path().join("labels.txt");
        std::fs::write(&labels, "\n\n").unwrap();

        let mut currency = detector_config(dir.path(), LabelTable::currency());
        currency.labels_path = Some(labels);

        let config = VisionModelConfig {
            currency: Some(currency),
            walkalong: None,
        };

        assert!(VisionModelManager::new(config).await.is_err());
    }

    #[test]
    fn test_list_models_reports_availability() {
        let manager = VisionModelManager::from_pipelines(
            Some(Arc::new(currency_pipeline(currency_detector(vec![])))),
            None,
        );

        let models = manager.list_models();
        let currency = models
            .iter()
            .find(|m| m.name == "currency-detector")
            .unwrap();
        assert!(currency.available);
        assert!(models
            .iter()
            .filter(|m| m.name != "currency-detector")
            .all(|m| !m.available));
    }
}
