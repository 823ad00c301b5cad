//! [`FaceDetector`] backed by the `BlazeFace` network.

// Pixel coordinates from normalized floats
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{load_safetensors, select_device, BlazeFace, BlazeFaceConfig, DevicePreference, RawFace};
use crate::domain::{Bitmap, Detection, FaceBox};
use crate::ports::FaceDetector;

/// Production face detector.
///
/// Loads weights once at construction; `detect` is read-only afterwards.
pub struct BlazeFaceDetector {
    model: BlazeFace,
}

impl BlazeFaceDetector {
    /// Loads `BlazeFace` weights from a safetensors file.
    ///
    /// # Errors
    ///
    /// Returns an error if the weights cannot be read or do not match the
    /// network layout.
    pub fn load(
        weights: impl AsRef<Path>,
        config: BlazeFaceConfig,
        device: DevicePreference,
    ) -> Result<Self> {
        let weights = weights.as_ref();
        let device = select_device(device);
        let vb = load_safetensors(weights, &device).context("Failed to load BlazeFace weights")?;
        let model = BlazeFace::new(vb, config).context("Failed to create BlazeFace model")?;

        info!(
            "Loaded BlazeFace from {} (score >= {}, nms iou < {})",
            weights.display(),
            config.score_threshold,
            config.nms_threshold
        );
        Ok(Self { model })
    }
}

impl FaceDetector for BlazeFaceDetector {
    fn name(&self) -> &'static str {
        "blazeface"
    }

    fn detect(&self, bitmap: &Bitmap) -> Result<Vec<Detection>> {
        let (width, height) = bitmap.dimensions();
        let faces = self.model.detect(&bitmap.to_rgb_image())?;
        debug!("BlazeFace found {} face(s) in {width}x{height}", faces.len());

        Ok(faces
            .iter()
            .map(|face| to_pixel_detection(face, width, height))
            .collect())
    }
}

/// Scales a normalized network output to the bitmap's pixel grid.
fn to_pixel_detection(face: &RawFace, width: u32, height: u32) -> Detection {
    let sx = width as f32;
    let sy = height as f32;
    let [x_min, y_min, x_max, y_max] = face.bbox;

    let x = (x_min * sx).round() as i32;
    let y = (y_min * sy).round() as i32;
    let right = (x_max * sx).round() as i32;
    let bottom = (y_max * sy).round() as i32;

    Detection {
        bbox: FaceBox::new(x, y, (right - x).max(0), (bottom - y).max(0)),
        confidence: Some(face.score),
        keypoints: face
            .keypoints
            .iter()
            .map(|[kx, ky]| [(kx * sx).round() as i32, (ky * sy).round() as i32])
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::NUM_KEYPOINTS;

    #[test]
    fn test_to_pixel_detection_scales_non_square() {
        let face = RawFace {
            bbox: [0.1, 0.25, 0.5, 0.75],
            score: 0.9,
            keypoints: [[0.5, 0.5]; NUM_KEYPOINTS],
        };

        let detection = to_pixel_detection(&face, 200, 100);
        assert_eq!(detection.bbox, FaceBox::new(20, 25, 80, 50));
        assert_eq!(detection.confidence, Some(0.9));
        assert_eq!(detection.keypoints.len(), NUM_KEYPOINTS);
        assert_eq!(detection.keypoints[0], [100, 50]);
    }

    #[test]
    fn test_load_missing_weights_fails() {
        let result = BlazeFaceDetector::load(
            "/nonexistent/blazeface.safetensors",
            BlazeFaceConfig::default(),
            DevicePreference::Cpu,
        );
        assert!(result.is_err());
    }
}
