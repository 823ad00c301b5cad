//! Face detector port.

use crate::domain::{Bitmap, Detection};

/// A pretrained face detector, treated as an oracle.
///
/// Constructed once per process and shared across interactions, so `detect`
/// takes `&self` and must not mutate shared state.
pub trait FaceDetector: Send + Sync {
    /// Returns the name of this detector backend.
    fn name(&self) -> &'static str;

    /// Detects faces in a bitmap.
    ///
    /// Returned boxes are in the bitmap's pixel coordinates. They are drawn
    /// as-is; no threshold or suppression is applied by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn detect(&self, bitmap: &Bitmap) -> anyhow::Result<Vec<Detection>>;
}
