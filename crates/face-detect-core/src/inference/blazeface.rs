//! `BlazeFace` face detection network.
//!
//! Implements the `BlazeFace` architecture for fast face detection with keypoints.
//! Based on the paper "`BlazeFace`: Sub-millisecond Neural Face Detection on Mobile GPUs"
//! and the `PyTorch` implementation at <https://github.com/hollance/BlazeFace-PyTorch>.

// Allow common ML code patterns
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use std::collections::VecDeque;

use anyhow::{Context, Result};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{conv2d, Conv2d, Conv2dConfig, VarBuilder};
use image::RgbImage;

/// Input image size for `BlazeFace`.
pub const INPUT_SIZE: usize = 128;

/// Number of anchor boxes (detections).
const NUM_ANCHORS: usize = 896;

/// Number of facial keypoints regressed per anchor.
pub const NUM_KEYPOINTS: usize = 6;

/// Post-processing thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlazeFaceConfig {
    /// Minimum sigmoid score for a candidate to be kept.
    pub score_threshold: f32,
    /// IoU above which lower-scoring overlapping candidates are suppressed.
    pub nms_threshold: f32,
}

impl Default for BlazeFaceConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.75,
            nms_threshold: 0.3,
        }
    }
}

/// A face found by the network, in normalized `[0, 1]` image coordinates.
#[derive(Debug, Clone)]
pub struct RawFace {
    /// `[x_min, y_min, x_max, y_max]`.
    pub bbox: [f32; 4],
    /// Detection confidence score.
    pub score: f32,
    /// Right eye, left eye, nose, mouth, right ear, left ear; each `[x, y]`.
    pub keypoints: [[f32; 2]; NUM_KEYPOINTS],
}

/// `BlazeBlock` - the core building block of `BlazeFace`.
///
/// Depthwise separable convolution with optional stride. Convolutions carry
/// biases (BatchNorm folded in) to match the pretrained weights.
struct BlazeBlock {
    depthwise: Conv2d,
    pointwise: Conv2d,
    channel_pad: usize,
    stride: usize,
}

impl BlazeBlock {
    #[allow(clippy::similar_names)]
    fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        vb: &VarBuilder,
    ) -> Result<Self> {
        let padding = if stride == 2 {
            0
        } else {
            (kernel_size - 1) / 2
        };

        let depthwise = conv2d(
            in_channels,
            in_channels,
            kernel_size,
            Conv2dConfig {
                stride,
                padding,
                groups: in_channels,
                ..Conv2dConfig::default()
            },
            vb.pp("depthwise"),
        )?;

        let pointwise = conv2d(
            in_channels,
            out_channels,
            1,
            Conv2dConfig::default(),
            vb.pp("pointwise"),
        )?;

        Ok(Self {
            depthwise,
            pointwise,
            channel_pad: out_channels.saturating_sub(in_channels),
            stride,
        })
    }
}

impl Module for BlazeBlock {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        // Stride-2 blocks pad asymmetrically (right/bottom only)
        let x_padded = if self.stride == 2 {
            x.pad_with_zeros(2, 0, 2)?.pad_with_zeros(3, 0, 2)?
        } else {
            x.clone()
        };

        let h = self.depthwise.forward(&x_padded)?.relu()?;
        let h = self.pointwise.forward(&h)?;

        let residual = if self.stride == 2 {
            x.max_pool2d(2)?
        } else {
            x.clone()
        };

        let residual = if self.channel_pad > 0 {
            residual.pad_with_zeros(1, 0, self.channel_pad)?
        } else {
            residual
        };

        (h + residual)?.relu()
    }
}

/// `BlazeFace` front-camera face detection model.
pub struct BlazeFace {
    conv0: Conv2d,
    backbone1: Vec<BlazeBlock>,
    backbone2: Vec<BlazeBlock>,
    classifier_16: Conv2d,
    regressor_16: Conv2d,
    classifier_8: Conv2d,
    regressor_8: Conv2d,
    anchors: Vec<[f32; 2]>,
    device: Device,
    config: BlazeFaceConfig,
}

impl BlazeFace {
    /// Builds the network from weights.
    ///
    /// # Errors
    ///
    /// Returns an error if model weights are missing or have the wrong shape.
    #[allow(clippy::needless_pass_by_value)]
    pub fn new(vb: VarBuilder, config: BlazeFaceConfig) -> Result<Self> {
        let device = vb.device().clone();

        let conv0 = conv2d(
            3,
            24,
            5,
            Conv2dConfig {
                stride: 2,
                ..Conv2dConfig::default()
            },
            vb.pp("conv0"),
        )?;

        // (in, out, kernel, stride); 64x64 after conv0, down to 16x16
        let backbone1_config = [
            (24, 24, 3, 1),
            (24, 28, 3, 1),
            (28, 32, 3, 2),
            (32, 36, 3, 1),
            (36, 42, 3, 1),
            (42, 48, 3, 2),
            (48, 56, 3, 1),
            (56, 64, 3, 1),
            (64, 72, 3, 1),
            (72, 80, 3, 1),
            (80, 88, 3, 1),
        ];
        let backbone1 = build_blocks(&backbone1_config, &vb.pp("backbone1"))?;

        // 16x16 down to 8x8
        let backbone2_config = [
            (88, 96, 3, 2),
            (96, 96, 3, 1),
            (96, 96, 3, 1),
            (96, 96, 3, 1),
            (96, 96, 3, 1),
        ];
        let backbone2 = build_blocks(&backbone2_config, &vb.pp("backbone2"))?;

        // 2 anchors per 16x16 cell, 6 per 8x8 cell; 16 regression values each
        let classifier_16 = conv2d(88, 2, 1, Conv2dConfig::default(), vb.pp("classifier_16"))?;
        let regressor_16 = conv2d(88, 32, 1, Conv2dConfig::default(), vb.pp("regressor_16"))?;
        let classifier_8 = conv2d(96, 6, 1, Conv2dConfig::default(), vb.pp("classifier_8"))?;
        let regressor_8 = conv2d(96, 96, 1, Conv2dConfig::default(), vb.pp("regressor_8"))?;

        Ok(Self {
            conv0,
            backbone1,
            backbone2,
            classifier_16,
            regressor_16,
            classifier_8,
            regressor_8,
            anchors: anchor_centers(),
            device,
            config,
        })
    }

    /// Resizes to 128x128 and normalizes to `[-1, 1]`, NCHW.
    fn preprocess(&self, image: &RgbImage) -> Result<Tensor> {
        let resized = image::imageops::resize(
            image,
            INPUT_SIZE as u32,
            INPUT_SIZE as u32,
            image::imageops::FilterType::Triangle,
        );

        let data: Vec<f32> = resized
            .pixels()
            .flat_map(|p| p.0.map(|c| (f32::from(c) / 127.5) - 1.0))
            .collect();

        Tensor::from_vec(data, (1, INPUT_SIZE, INPUT_SIZE, 3), &self.device)?
            .permute((0, 3, 1, 2))?
            .to_dtype(DType::F32)
            .context("Failed to preprocess image")
    }

    fn forward(&self, x: &Tensor) -> Result<(Tensor, Tensor)> {
        let x = x.pad_with_zeros(2, 1, 2)?.pad_with_zeros(3, 1, 2)?;
        let mut h = self.conv0.forward(&x)?.relu()?;

        for block in &self.backbone1 {
            h = block.forward(&h)?;
        }
        let feature_16 = h.clone();

        for block in &self.backbone2 {
            h = block.forward(&h)?;
        }
        let feature_8 = h;

        let c1 = self
            .classifier_16
            .forward(&feature_16)?
            .permute((0, 2, 3, 1))?
            .reshape((1, 512, 1))?;
        let r1 = self
            .regressor_16
            .forward(&feature_16)?
            .permute((0, 2, 3, 1))?
            .reshape((1, 512, 16))?;
        let c2 = self
            .classifier_8
            .forward(&feature_8)?
            .permute((0, 2, 3, 1))?
            .reshape((1, 384, 1))?;
        let r2 = self
            .regressor_8
            .forward(&feature_8)?
            .permute((0, 2, 3, 1))?
            .reshape((1, 384, 16))?;

        Ok((Tensor::cat(&[c1, c2], 1)?, Tensor::cat(&[r1, r2], 1)?))
    }

    /// Detects faces in an RGB image.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    pub fn detect(&self, image: &RgbImage) -> Result<Vec<RawFace>> {
        let input = self.preprocess(image)?;
        let (scores, boxes) = self.forward(&input)?;
        let scores = scores.squeeze(0)?.to_vec2::<f32>()?;
        let boxes = boxes.squeeze(0)?.to_vec2::<f32>()?;

        let candidates = decode(&self.anchors, &scores, &boxes, self.config.score_threshold);
        Ok(non_max_suppression(candidates, self.config.nms_threshold))
    }
}

fn build_blocks(config: &[(usize, usize, usize, usize)], vb: &VarBuilder) -> Result<Vec<BlazeBlock>> {
    config
        .iter()
        .enumerate()
        .map(|(i, &(in_c, out_c, k, s))| BlazeBlock::new(in_c, out_c, k, s, &vb.pp(i.to_string())))
        .collect()
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Anchor centers for the 16x16 (2 per cell) and 8x8 (6 per cell) grids.
fn anchor_centers() -> Vec<[f32; 2]> {
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);
    for (grid, per_cell) in [(16_u8, 2), (8_u8, 6)] {
        let size = f32::from(grid);
        for y in 0..grid {
            for x in 0..grid {
                let center = [(f32::from(x) + 0.5) / size, (f32::from(y) + 0.5) / size];
                anchors.extend(std::iter::repeat(center).take(per_cell));
            }
        }
    }
    anchors
}

/// Turns raw regressor output into candidate faces above `threshold`.
fn decode(
    anchors: &[[f32; 2]],
    scores: &[Vec<f32>],
    boxes: &[Vec<f32>],
    threshold: f32,
) -> Vec<RawFace> {
    let scale = INPUT_SIZE as f32;
    let mut faces = Vec::new();

    for ((anchor, score), raw) in anchors.iter().zip(scores).zip(boxes) {
        let score = sigmoid(score[0]);
        if score < threshold {
            continue;
        }

        let cx = anchor[0] + raw[0] / scale;
        let cy = anchor[1] + raw[1] / scale;
        let w = raw[2] / scale;
        let h = raw[3] / scale;

        let mut keypoints = [[0.0f32; 2]; NUM_KEYPOINTS];
        for (k, point) in keypoints.iter_mut().enumerate() {
            let kx = anchor[0] + raw[4 + k * 2] / scale;
            let ky = anchor[1] + raw[5 + k * 2] / scale;
            *point = [kx.clamp(0.0, 1.0), ky.clamp(0.0, 1.0)];
        }

        faces.push(RawFace {
            bbox: [
                (cx - w / 2.0).clamp(0.0, 1.0),
                (cy - h / 2.0).clamp(0.0, 1.0),
                (cx + w / 2.0).clamp(0.0, 1.0),
                (cy + h / 2.0).clamp(0.0, 1.0),
            ],
            score,
            keypoints,
        });
    }

    faces
}

/// Greedy NMS: keep the best-scoring face, drop everything overlapping it.
fn non_max_suppression(mut faces: Vec<RawFace>, threshold: f32) -> Vec<RawFace> {
    faces.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut pending: VecDeque<RawFace> = faces.into();
    let mut keep = Vec::new();

    while let Some(best) = pending.pop_front() {
        pending.retain(|other| iou(&best.bbox, &other.bbox) < threshold);
        keep.push(best);
    }

    keep
}

/// Intersection over Union for two `[x_min, y_min, x_max, y_max]` boxes.
fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    let union = area_a + area_b - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(bbox: [f32; 4], score: f32) -> RawFace {
        RawFace {
            bbox,
            score,
            keypoints: [[0.0; 2]; NUM_KEYPOINTS],
        }
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(10.0) > 0.999);
        assert!(sigmoid(-10.0) < 0.001);
    }

    #[test]
    fn test_anchor_count() {
        let anchors = anchor_centers();
        assert_eq!(anchors.len(), NUM_ANCHORS);
        assert!((anchors[0][0] - 0.5 / 16.0).abs() < 1e-6);
        assert!((anchors[NUM_ANCHORS - 1][1] - 7.5 / 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_no_overlap() {
        let a = [0.0, 0.0, 0.5, 0.5];
        let b = [0.6, 0.6, 1.0, 1.0];
        assert!(iou(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_iou_full_overlap() {
        let a = [0.0, 0.0, 1.0, 1.0];
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_partial_overlap() {
        let a = [0.0, 0.0, 0.5, 0.5];
        let b = [0.25, 0.25, 0.75, 0.75];
        let expected = 0.0625 / 0.4375;
        assert!((iou(&a, &b) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_nms_keeps_best_of_overlapping() {
        let faces = vec![
            face([0.0, 0.0, 0.5, 0.5], 0.8),
            face([0.01, 0.01, 0.5, 0.5], 0.95),
            face([0.6, 0.6, 0.9, 0.9], 0.9),
        ];
        let kept = non_max_suppression(faces, 0.3);
        assert_eq!(kept.len(), 2);
        assert!((kept[0].score - 0.95).abs() < 1e-6);
        assert!((kept[1].score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_decode_applies_threshold() {
        let anchors = vec![[0.5, 0.5], [0.25, 0.25]];
        let scores = vec![vec![5.0], vec![-5.0]];
        let boxes = vec![vec![0.0; 16], vec![0.0; 16]];
        let mut with_size = boxes.clone();
        with_size[0][2] = 32.0;
        with_size[0][3] = 32.0;

        let faces = decode(&anchors, &scores, &with_size, 0.75);
        assert_eq!(faces.len(), 1);
        let [x0, y0, x1, y1] = faces[0].bbox;
        assert!((x0 - 0.375).abs() < 1e-6);
        assert!((y0 - 0.375).abs() < 1e-6);
        assert!((x1 - 0.625).abs() < 1e-6);
        assert!((y1 - 0.625).abs() < 1e-6);
    }
}
