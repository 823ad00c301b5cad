//! What one interaction renders.

use std::fmt;

use serde::Serialize;

use super::{Detection, GalleryImage, Notice};

/// Orchestrator state for one interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// No images: show instructions.
    Idle,
    /// Images acquired; detection and annotation running.
    Processing,
    /// Results rendered.
    Displayed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Displayed => "displayed",
        })
    }
}

/// One annotated image plus what produced it.
#[derive(Debug, Clone)]
pub struct DisplayedImage {
    /// Name of the uploaded file.
    pub source: String,
    /// Everything the detector returned for this image.
    pub detections: Vec<Detection>,
    /// Annotated, display-order image with its caption.
    pub image: GalleryImage,
}

/// Result of one full run of the pipeline.
#[derive(Debug, Clone)]
pub enum Page {
    /// Nothing was acquired.
    Idle {
        /// Messages to show above the instructions.
        notices: Vec<Notice>,
    },
    /// At least one image was processed.
    Displayed {
        /// Messages (e.g. skipped files).
        notices: Vec<Notice>,
        /// Annotated images in upload order.
        gallery: Vec<DisplayedImage>,
    },
}

impl Page {
    /// The state this page represents.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Idle { .. } => Stage::Idle,
            Self::Displayed { .. } => Stage::Displayed,
        }
    }

    /// Inline messages for this page.
    #[must_use]
    pub fn notices(&self) -> &[Notice] {
        match self {
            Self::Idle { notices } | Self::Displayed { notices, .. } => notices,
        }
    }

    /// Displayed images; empty when idle.
    #[must_use]
    pub fn gallery(&self) -> &[DisplayedImage] {
        match self {
            Self::Idle { .. } => &[],
            Self::Displayed { gallery, .. } => gallery,
        }
    }
}

/// Machine-readable summary of one displayed image.
#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    /// Gallery caption.
    pub caption: String,
    /// Name of the uploaded file.
    pub source: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Detector output.
    pub faces: Vec<Detection>,
}

impl From<&DisplayedImage> for ImageReport {
    fn from(displayed: &DisplayedImage) -> Self {
        let (width, height) = displayed.image.image().dimensions();
        Self {
            caption: displayed.image.caption().to_string(),
            source: displayed.source.clone(),
            width,
            height,
            faces: displayed.detections.clone(),
        }
    }
}
