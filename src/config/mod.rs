// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration from command-line flags and environment

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::vision::depth::{ChannelOrder, DepthPreprocessConfig};
use crate::vision::detection::{LabelTable, YoloConfig};
use crate::vision::model_manager::{DetectorModelConfig, WalkAlongModelConfig};
use crate::vision::weights::WeightSource;
use crate::vision::{DepthLookupMode, VisionModelConfig};

/// Which service(s) this process runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceKind {
    /// Currency detection only (`POST /detect`)
    Currency,
    /// Walk-along only (`GET /`, `POST /walkalong`)
    Walkalong,
    /// Both, each on its own port
    All,
}

impl ServiceKind {
    pub fn runs_currency(self) -> bool {
        matches!(self, ServiceKind::Currency | ServiceKind::All)
    }

    pub fn runs_walkalong(self) -> bool {
        matches!(self, ServiceKind::Walkalong | ServiceKind::All)
    }
}

/// Vision node for currency detection and walk-along obstacle distances
#[derive(Parser, Debug, Clone)]
#[command(name = "walkalong-node")]
#[command(about = "Currency detection and walk-along obstacle distance services", long_about = None)]
pub struct ServiceConfig {
    /// Service(s) to run
    #[arg(long, env = "SERVICE", value_enum, default_value_t = ServiceKind::All)]
    pub service: ServiceKind,

    /// Bind address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the currency detection service
    #[arg(long, env = "DETECT_PORT", default_value_t = 5000)]
    pub detect_port: u16,

    /// Port for the walk-along service
    #[arg(long, env = "WALKALONG_PORT", default_value_t = 10000)]
    pub walkalong_port: u16,

    /// Currency detector weights (ONNX)
    #[arg(long, env = "CURRENCY_MODEL_PATH", default_value = "models/currency.onnx")]
    pub currency_model_path: PathBuf,

    /// Download URL used when the currency weights are missing
    #[arg(long, env = "CURRENCY_MODEL_URL")]
    pub currency_model_url: Option<String>,

    /// Currency labels file, one name per line (built-in table otherwise)
    #[arg(long, env = "CURRENCY_LABELS_PATH")]
    pub currency_labels_path: Option<PathBuf>,

    /// Obstacle detector weights (ONNX)
    #[arg(long, env = "OBSTACLE_MODEL_PATH", default_value = "models/yolov8s.onnx")]
    pub obstacle_model_path: PathBuf,

    /// Download URL used when the obstacle weights are missing
    #[arg(long, env = "OBSTACLE_MODEL_URL")]
    pub obstacle_model_url: Option<String>,

    /// Obstacle labels file (COCO names otherwise)
    #[arg(long, env = "OBSTACLE_LABELS_PATH")]
    pub obstacle_labels_path: Option<PathBuf>,

    /// Metric depth estimator weights (ONNX)
    #[arg(
        long,
        env = "DEPTH_MODEL_PATH",
        default_value = "models/depth_anything_v2_metric_hypersim_vits.onnx"
    )]
    pub depth_model_path: PathBuf,

    /// Download URL used when the depth weights are missing
    #[arg(long, env = "DEPTH_MODEL_URL")]
    pub depth_model_url: Option<String>,

    /// Minimum detector confidence
    #[arg(long, env = "CONFIDENCE_THRESHOLD", default_value_t = 0.25)]
    pub confidence_threshold: f32,

    /// NMS IoU threshold
    #[arg(long, env = "IOU_THRESHOLD", default_value_t = 0.7)]
    pub iou_threshold: f32,

    /// Box-center to depth-grid mapping
    #[arg(long, env = "DEPTH_LOOKUP", value_enum, default_value_t = DepthLookupMode::Raw)]
    pub depth_lookup: DepthLookupMode,

    /// Channel order of the depth model input
    #[arg(long, env = "DEPTH_CHANNEL_ORDER", value_enum, default_value_t = ChannelOrder::Bgr)]
    pub depth_channel_order: ChannelOrder,

    /// ONNX Runtime intra-op threads per session
    #[arg(long, env = "INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,
}

impl ServiceConfig {
    pub fn detect_addr(&self) -> Result<SocketAddr> {
        self.socket_addr(self.detect_port)
    }

    pub fn walkalong_addr(&self) -> Result<SocketAddr> {
        self.socket_addr(self.walkalong_port)
    }

    fn socket_addr(&self, port: u16) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .with_context(|| format!("Invalid HOST: {}", self.host))?;
        Ok(SocketAddr::new(ip, port))
    }

    fn yolo_config(&self) -> YoloConfig {
        YoloConfig {
            confidence_threshold: self.confidence_threshold,
            iou_threshold: self.iou_threshold,
            intra_threads: self.intra_threads,
            ..YoloConfig::default()
        }
    }

    /// Model set for the configured service(s)
    pub fn vision_model_config(&self) -> VisionModelConfig {
        let currency = self.service.runs_currency().then(|| DetectorModelConfig {
            weights: WeightSource::new(&self.currency_model_path, self.currency_model_url.clone()),
            labels_path: self.currency_labels_path.clone(),
            default_labels: LabelTable::currency(),
            yolo: self.yolo_config(),
        });

        let walkalong = self.service.runs_walkalong().then(|| WalkAlongModelConfig {
            detector: DetectorModelConfig {
                weights: WeightSource::new(
                    &self.obstacle_model_path,
                    self.obstacle_model_url.clone(),
                ),
                labels_path: self.obstacle_labels_path.clone(),
                default_labels: LabelTable::coco(),
                yolo: self.yolo_config(),
            },
            depth_weights: WeightSource::new(&self.depth_model_path, self.depth_model_url.clone()),
            depth_preprocess: DepthPreprocessConfig {
                channel_order: self.depth_channel_order,
                ..DepthPreprocessConfig::default()
            },
            lookup: self.depth_lookup,
            intra_threads: self.intra_threads,
        });

        VisionModelConfig {
            currency,
            walkalong,
        }
    }
}
