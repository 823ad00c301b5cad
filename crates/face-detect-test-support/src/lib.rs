//! Test support utilities for face-detect.
//!
//! Provides a stub detector oracle, mock ports and synthetic uploads for
//! testing the pipeline without model weights or a browser.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use face_detect_core::{FaceDetectionApp, NoProgress};
//! use face_detect_test_support::{MockUploadSource, StubDetector, SyntheticImageBuilder};
//!
//! let detector = StubDetector::from_json(r#"[{"box":[10,10,30,30]}]"#).unwrap();
//! let source = MockUploadSource::new(vec![
//!     SyntheticImageBuilder::black_png("face.png", 100, 100),
//!     SyntheticImageBuilder::truncated_png("broken.png"),
//! ]);
//!
//! let page = FaceDetectionApp::new(Arc::new(detector))
//!     .run(&source, &NoProgress)
//!     .unwrap();
//! assert_eq!(page.gallery().len(), 1);
//! assert_eq!(page.notices().len(), 1);
//! ```

mod builders;
mod mocks;

pub use builders::SyntheticImageBuilder;
pub use mocks::{FailingDetector, MockProgressSink, MockReportOutput, MockUploadSource, StubDetector};
