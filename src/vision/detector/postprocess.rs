// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Decoding of YOLO model outputs
//!
//! Two export layouts are understood:
//! - End-to-end (YOLOv10, NMS-free): `[1, N, 6]` rows of `x1, y1, x2, y2, score, class`
//! - Raw head (YOLOv8 style): `[1, 4 + C, A]` with `cx, cy, w, h` followed by
//!   one score per class, decoded with greedy NMS

use anyhow::Result;
use ndarray::{ArrayViewD, Axis, Ix3};
use std::cmp::Ordering;

use super::preprocessing::Letterbox;
use super::NativeDetection;

/// IoU above which a lower scoring box of the same class is suppressed
pub const NMS_IOU_THRESHOLD: f32 = 0.7;

/// Maximum detections kept per image
pub const MAX_DETECTIONS: usize = 300;

/// Columns per row in an end-to-end export
const END_TO_END_COLUMNS: usize = 6;

/// Output tensor layout, inferred from its shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    EndToEnd,
    RawHead { num_classes: usize },
}

impl OutputLayout {
    pub fn from_shape(shape: &[usize]) -> Result<Self> {
        if shape.len() != 3 || shape[0] != 1 {
            anyhow::bail!(
                "Unexpected detection output shape: {:?}, expected [1, N, 6] or [1, 4+C, A]",
                shape
            );
        }

        if shape[2] == END_TO_END_COLUMNS {
            Ok(OutputLayout::EndToEnd)
        } else if shape[1] > 4 {
            Ok(OutputLayout::RawHead {
                num_classes: shape[1] - 4,
            })
        } else {
            anyhow::bail!("Detection output has no class scores: {:?}", shape)
        }
    }
}

/// Decode a model output tensor into detections in original image pixels.
///
/// Only detections scoring strictly above `confidence_threshold` are kept.
pub fn decode_output(
    output: ArrayViewD<f32>,
    letterbox: &Letterbox,
    confidence_threshold: f32,
) -> Result<Vec<NativeDetection>> {
    let layout = OutputLayout::from_shape(output.shape())?;
    let output = output.into_dimensionality::<Ix3>()?;
    let batch = output.index_axis(Axis(0), 0);

    let candidates = match layout {
        OutputLayout::EndToEnd => batch
            .outer_iter()
            .filter_map(|row| {
                let score = row[4];
                let class = row[5];
                if score.is_nan() || score <= confidence_threshold || !class.is_finite() || class < 0.0 {
                    return None;
                }
                Some(NativeDetection {
                    xyxy: [row[0], row[1], row[2], row[3]],
                    confidence: score,
                    class_id: class.round() as u32,
                })
            })
            .take(MAX_DETECTIONS)
            .collect::<Vec<_>>(),
        OutputLayout::RawHead { num_classes } => {
            let mut candidates = Vec::new();
            for anchor in batch.axis_iter(Axis(1)) {
                let best = (0..num_classes)
                    .map(|c| (c, anchor[4 + c]))
                    .filter(|(_, score)| score.is_finite())
                    .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

                let Some((class_id, score)) = best else {
                    continue;
                };
                if score <= confidence_threshold {
                    continue;
                }

                let (cx, cy, w, h) = (anchor[0], anchor[1], anchor[2], anchor[3]);
                candidates.push(NativeDetection {
                    xyxy: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
                    confidence: score,
                    class_id: class_id as u32,
                });
            }
            non_max_suppression(candidates, NMS_IOU_THRESHOLD, MAX_DETECTIONS)
        }
    };

    Ok(candidates
        .into_iter()
        .filter(|d| d.xyxy.iter().all(|v| v.is_finite()))
        .map(|d| NativeDetection {
            xyxy: letterbox.to_original(d.xyxy),
            ..d
        })
        .collect())
}

/// Class-aware greedy NMS. Returns survivors in descending score order.
pub fn non_max_suppression(
    mut candidates: Vec<NativeDetection>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<NativeDetection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<NativeDetection> = Vec::new();
    for candidate in candidates {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && iou(&k.xyxy, &candidate.xyxy) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

/// Intersection over union of two `[x1, y1, x2, y2]` boxes
pub fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let ix = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let iy = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let intersection = ix * iy;

    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - intersection;

    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}
