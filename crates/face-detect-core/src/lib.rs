//! Face Detect Core - Domain types, ports and pipeline
//!
//! This crate contains the upload → decode → detect → annotate → display
//! pipeline, the ports it talks to, and the `BlazeFace` detector backend.

pub mod domain;
pub mod inference;
pub mod pipeline;
pub mod ports;

pub use domain::{
    Bitmap, DecodeError, Detection, DisplayedImage, FaceBox, GalleryImage, ImageReport, Notice,
    Page, Severity, Stage, UploadedBlob,
};
pub use pipeline::FaceDetectionApp;
pub use ports::{FaceDetector, NoProgress, ProgressEvent, ProgressSink, ReportOutput, UploadSource};
