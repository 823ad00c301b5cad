//! The four pipeline stages and the orchestrator that runs them.
//!
//! Data flows strictly forward: acquire → detect → annotate → present.

mod acquire;
mod annotate;
mod app;
mod present;

pub use acquire::{acquire, AcquiredImage, Acquisition};
pub use annotate::{annotate, detect_and_annotate, AnnotationStyle, FACE_BOX_COLOR, STROKE_WIDTH};
pub use app::FaceDetectionApp;
pub use present::{caption_for, present};
