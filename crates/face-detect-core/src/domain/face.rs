//! Face boxes and detector records.

use serde::{Deserialize, Serialize};

/// Axis-aligned face box in pixel coordinates, top-left origin.
///
/// Serializes as the four-element array `[x, y, width, height]`, the same
/// shape detector records use for their `box` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct FaceBox {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width; expected to be non-negative.
    pub width: i32,
    /// Height; expected to be non-negative.
    pub height: i32,
}

impl FaceBox {
    /// Creates a new face box.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bottom-right corner, `(x + width, y + height)`.
    #[must_use]
    pub const fn corner(&self) -> (i32, i32) {
        (
            self.x.saturating_add(self.width),
            self.y.saturating_add(self.height),
        )
    }
}

impl From<[i32; 4]> for FaceBox {
    fn from([x, y, width, height]: [i32; 4]) -> Self {
        Self::new(x, y, width, height)
    }
}

impl From<FaceBox> for [i32; 4] {
    fn from(b: FaceBox) -> Self {
        [b.x, b.y, b.width, b.height]
    }
}

/// One face reported by a detector.
///
/// Only `box` is required; the pipeline ignores the other fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Face bounding box.
    #[serde(rename = "box")]
    pub bbox: FaceBox,
    /// Detector confidence (0.0 to 1.0), when the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    /// Facial keypoints `[x, y]` in pixel coordinates, when reported.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keypoints: Vec<[i32; 2]>,
}

impl Detection {
    /// A detection carrying only a box.
    #[must_use]
    pub const fn from_box(bbox: FaceBox) -> Self {
        Self {
            bbox,
            confidence: None,
            keypoints: Vec::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_corner() {
        assert_eq!(FaceBox::new(10, 10, 30, 30).corner(), (40, 40));
    }

    #[test]
    fn test_corner_saturates() {
        assert_eq!(FaceBox::new(i32::MAX, 0, 5, 0).corner(), (i32::MAX, 0));
    }

    #[test]
    fn test_parse_box_only_record() {
        let parsed: Vec<Detection> = serde_json::from_str(r#"[{"box":[10,10,30,30]}]"#).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].bbox, FaceBox::new(10, 10, 30, 30));
        assert!(parsed[0].confidence.is_none());
        assert!(parsed[0].keypoints.is_empty());
    }

    #[test]
    fn test_parse_ignores_extra_fields() {
        let json = r#"{"box":[1,2,3,4],"confidence":0.99,"keypoints":[[5,6]],"extra":true}"#;
        let parsed: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.bbox, FaceBox::new(1, 2, 3, 4));
        assert_eq!(parsed.confidence, Some(0.99));
        assert_eq!(parsed.keypoints, vec![[5, 6]]);
    }

    #[test]
    fn test_serialize_box_as_array() {
        let json = serde_json::to_string(&Detection::from_box(FaceBox::new(1, 2, 3, 4))).unwrap();
        assert_eq!(json, r#"{"box":[1,2,3,4]}"#);
    }
}
