// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Letterbox preprocessing and YOLO output decoding

use image::{imageops::FilterType, Rgb, RgbImage};
use ndarray::{Array4, ArrayViewD, Axis, Ix2};

use crate::vision::types::RawDetection;

/// Gray used by Ultralytics to pad letterboxed inputs
pub const LETTERBOX_FILL: u8 = 114;

/// Geometry of a letterbox transform, used to map boxes back
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_width: u32,
    pub orig_height: u32,
}

impl Letterbox {
    /// Map a model-space point back to the original image
    pub fn unmap(&self, x: f32, y: f32) -> (f32, f32) {
        let ox = ((x - self.pad_x) / self.scale).clamp(0.0, self.orig_width as f32);
        let oy = ((y - self.pad_y) / self.scale).clamp(0.0, self.orig_height as f32);
        (ox, oy)
    }
}

/// Resize keeping aspect ratio, center on a gray square, pack as NCHW in [0,1]
pub fn letterbox(image: &RgbImage, size: u32) -> (Array4<f32>, Letterbox) {
    let (w0, h0) = image.dimensions();
    let side = size as usize;
    let mut tensor = Array4::from_elem((1, 3, side, side), LETTERBOX_FILL as f32 / 255.0);

    if w0 == 0 || h0 == 0 {
        let geometry = Letterbox {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
            orig_width: w0,
            orig_height: h0,
        };
        return (tensor, geometry);
    }

    let scale = (size as f32 / w0 as f32).min(size as f32 / h0 as f32);
    let new_w = ((w0 as f32 * scale).round() as u32).clamp(1, size);
    let new_h = ((h0 as f32 * scale).round() as u32).clamp(1, size);
    let pad_x = (size - new_w) / 2;
    let pad_y = (size - new_h) / 2;

    let resized = image::imageops::resize(image, new_w, new_h, FilterType::Triangle);

    for (x, y, Rgb([r, g, b])) in resized.enumerate_pixels() {
        let tx = (x + pad_x) as usize;
        let ty = (y + pad_y) as usize;
        tensor[[0, 0, ty, tx]] = *r as f32 / 255.0;
        tensor[[0, 1, ty, tx]] = *g as f32 / 255.0;
        tensor[[0, 2, ty, tx]] = *b as f32 / 255.0;
    }

    let geometry = Letterbox {
        scale,
        pad_x: pad_x as f32,
        pad_y: pad_y as f32,
        orig_width: w0,
        orig_height: h0,
    };
    (tensor, geometry)
}

/// Decode a `[1, 4 + nc, N]` YOLOv8 head into candidate boxes
///
/// Rows 0..4 are cx, cy, w, h in model space; the rest are class scores.
pub fn decode_predictions(
    output: ArrayViewD<f32>,
    geometry: &Letterbox,
    confidence_threshold: f32,
) -> anyhow::Result<Vec<RawDetection>> {
    let shape = output.shape().to_vec();
    if shape.len() != 3 || shape[0] != 1 || shape[1] <= 4 {
        anyhow::bail!("Unexpected detection output shape: {:?}, expected [1, 4+nc, N]", shape);
    }

    let preds = output
        .index_axis(Axis(0), 0)
        .into_dimensionality::<Ix2>()?;
    let mut candidates = Vec::new();

    for anchor in preds.axis_iter(Axis(1)) {
        let (class_id, confidence) = anchor
            .iter()
            .skip(4)
            .copied()
            .enumerate()
            .fold((0usize, f32::MIN), |best, (id, score)| {
                if score > best.1 {
                    (id, score)
                } else {
                    best
                }
            });

        if confidence < confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (anchor[0], anchor[1], anchor[2], anchor[3]);
        let (x1, y1) = geometry.unmap(cx - w / 2.0, cy - h / 2.0);
        let (x2, y2) = geometry.unmap(cx + w / 2.0, cy + h / 2.0);

        candidates.push(RawDetection {
            x1,
            y1,
            x2,
            y2,
            confidence,
            class_id,
        });
    }

    Ok(candidates)
}

/// Intersection over union of two corner-format boxes
pub fn iou(a: &RawDetection, b: &RawDetection) -> f32 {
    let ix1 = a.x1.max(b.x1);
    let iy1 = a.y1.max(b.y1);
    let ix2 = a.x2.min(b.x2);
    let iy2 = a.y2.min(b.y2);

    let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
    let area_a = (a.x2 - a.x1).max(0.0) * (a.y2 - a.y1).max(0.0);
    let area_b = (b.x2 - b.x1).max(0.0) * (b.y2 - b.y1).max(0.0);
    let union = area_a + area_b - inter;

    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}

/// Class-aware non-maximum suppression
///
/// Output is sorted by descending confidence and capped at `max_detections`.
pub fn non_max_suppression(
    mut candidates: Vec<RawDetection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<RawDetection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut kept: Vec<RawDetection> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept
            .iter()
            .any(|k| k.class_id == candidate.class_id && iou(k, &candidate) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
