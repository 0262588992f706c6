// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image preprocessing for the depth model

use std::str::FromStr;

use image::{imageops::FilterType, Rgb, RgbImage};
use ndarray::Array4;

/// Working width of the depth model
pub const DEPTH_INPUT_WIDTH: u32 = 560;

/// Working height of the depth model
pub const DEPTH_INPUT_HEIGHT: u32 = 448;

/// Per-channel mean, maps [0,1] to [-1,1] together with `STD`
pub const MEAN: [f32; 3] = [0.5, 0.5, 0.5];

/// Per-channel std
pub const STD: [f32; 3] = [0.5, 0.5, 0.5];

/// Channel packing order of the depth input tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ChannelOrder {
    Rgb,
    /// Order the deployed metric checkpoint was served with
    #[default]
    Bgr,
}

impl FromStr for ChannelOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rgb" => Ok(ChannelOrder::Rgb),
            "bgr" => Ok(ChannelOrder::Bgr),
            other => Err(format!("unknown channel order '{}'", other)),
        }
    }
}

/// Depth preprocessing parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthPreprocessConfig {
    pub width: u32,
    pub height: u32,
    pub channel_order: ChannelOrder,
}

impl Default for DepthPreprocessConfig {
    fn default() -> Self {
        Self {
            width: DEPTH_INPUT_WIDTH,
            height: DEPTH_INPUT_HEIGHT,
            channel_order: ChannelOrder::default(),
        }
    }
}

/// Preprocess an image for depth estimation
///
/// Steps:
/// 1. Resize exactly to the working resolution (aspect ratio not kept)
/// 2. Normalize: (pixel / 255 - mean) / std
/// 3. Pack as NCHW `[1, 3, H, W]` in the configured channel order
pub fn preprocess_for_depth(image: &RgbImage, config: &DepthPreprocessConfig) -> Array4<f32> {
    let (width, height) = (config.width.max(1), config.height.max(1));
    let resized = image::imageops::resize(image, width, height, FilterType::Triangle);

    let mut tensor = Array4::zeros((1, 3, height as usize, width as usize));

    for (x, y, Rgb(rgb)) in resized.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        for c in 0..3 {
            let source = match config.channel_order {
                ChannelOrder::Rgb => c,
                ChannelOrder::Bgr => 2 - c,
            };
            tensor[[0, c, y, x]] = (rgb[source] as f32 / 255.0 - MEAN[c]) / STD[c];
        }
    }

    tensor
}
