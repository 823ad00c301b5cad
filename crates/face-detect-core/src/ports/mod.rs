//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the pipeline and external adapters.

mod face_detector;
mod progress;
mod report_output;
mod upload_source;

pub use face_detector::FaceDetector;
pub use progress::{NoProgress, ProgressEvent, ProgressSink};
pub use report_output::ReportOutput;
pub use upload_source::UploadSource;
