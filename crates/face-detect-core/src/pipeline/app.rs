//! Orchestrator: one full Idle → Processing → Displayed run per interaction.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{acquire, detect_and_annotate, present, AnnotationStyle};
use crate::domain::{DisplayedImage, Notice, Page, Stage};
use crate::ports::{FaceDetector, ProgressEvent, ProgressSink, UploadSource};

/// The face detection application.
///
/// Holds the detector for the lifetime of the process. [`run`](Self::run)
/// keeps no state between calls: every interaction is evaluated from scratch.
#[derive(Clone)]
pub struct FaceDetectionApp {
    detector: Arc<dyn FaceDetector>,
    style: AnnotationStyle,
}

impl FaceDetectionApp {
    /// Creates the app around an already-constructed detector.
    #[must_use]
    pub fn new(detector: Arc<dyn FaceDetector>) -> Self {
        Self {
            detector,
            style: AnnotationStyle::default(),
        }
    }

    /// Runs the whole pipeline for one batch of uploads.
    ///
    /// Returns [`Page::Idle`] when acquisition produced no images (empty
    /// upload, every file undecodable, or the source failed), otherwise
    /// [`Page::Displayed`] with one gallery entry per decoded upload.
    ///
    /// # Errors
    ///
    /// Detector failures are not recovered here; they abort this interaction.
    pub fn run(&self, source: &dyn UploadSource, progress: &dyn ProgressSink) -> Result<Page> {
        let acquisition = acquire(source, progress);
        let skipped = acquisition.skipped;
        let mut notices = acquisition.notices;

        if acquisition.images.is_empty() {
            debug!(stage = %Stage::Idle, skipped, "No images to process");
            notices.push(Notice::nothing_to_process());
            progress.on_event(ProgressEvent::Finished {
                displayed: 0,
                skipped,
            });
            return Ok(Page::Idle { notices });
        }

        debug!(
            stage = %Stage::Processing,
            images = acquisition.images.len(),
            detector = self.detector.name(),
            "Running detection"
        );

        let mut sources = Vec::with_capacity(acquisition.images.len());
        let mut detections = Vec::with_capacity(acquisition.images.len());
        let mut annotated = Vec::with_capacity(acquisition.images.len());

        for (index, image) in acquisition.images.iter().enumerate() {
            let (bitmap, found) =
                detect_and_annotate(self.detector.as_ref(), &image.bitmap, &self.style)
                    .with_context(|| format!("Face detection failed for {}", image.name))?;

            debug!("{}: {} face(s)", image.name, found.len());
            progress.on_event(ProgressEvent::Annotated {
                name: image.name.clone(),
                index,
                faces: found.len(),
            });

            sources.push(image.name.clone());
            detections.push(found);
            annotated.push(bitmap);
        }

        let gallery: Vec<DisplayedImage> = sources
            .into_iter()
            .zip(detections)
            .zip(present(annotated))
            .map(|((source, detections), image)| DisplayedImage {
                source,
                detections,
                image,
            })
            .collect();

        info!(
            stage = %Stage::Displayed,
            displayed = gallery.len(),
            skipped,
            "Interaction complete"
        );
        progress.on_event(ProgressEvent::Finished {
            displayed: gallery.len(),
            skipped,
        });

        Ok(Page::Displayed { notices, gallery })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;
    use crate::domain::{Bitmap, Detection, FaceBox, Severity, UploadedBlob};
    use crate::ports::NoProgress;

    struct Blobs(Vec<UploadedBlob>);

    impl UploadSource for Blobs {
        fn uploads(&self) -> Box<dyn Iterator<Item = Result<UploadedBlob>> + Send + '_> {
            Box::new(self.0.iter().cloned().map(Ok))
        }

        fn count_hint(&self) -> Option<usize> {
            Some(self.0.len())
        }
    }

    struct OneFace;

    impl FaceDetector for OneFace {
        fn name(&self) -> &'static str {
            "one-face"
        }

        fn detect(&self, _bitmap: &Bitmap) -> Result<Vec<Detection>> {
            Ok(vec![Detection::from_box(FaceBox::new(1, 1, 4, 4))])
        }
    }

    struct Broken;

    impl FaceDetector for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn detect(&self, _bitmap: &Bitmap) -> Result<Vec<Detection>> {
            anyhow::bail!("model exploded")
        }
    }

    fn png(name: &str) -> UploadedBlob {
        let mut bytes = Vec::new();
        RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]))
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        UploadedBlob::new(name, bytes)
    }

    #[test]
    fn test_empty_upload_is_idle() {
        let app = FaceDetectionApp::new(Arc::new(OneFace));
        let page = app.run(&Blobs(vec![]), &NoProgress).unwrap();

        assert_eq!(page.stage(), Stage::Idle);
        assert_eq!(page.notices().len(), 1);
        assert_eq!(page.notices()[0].severity, Severity::Info);
        assert!(page.gallery().is_empty());
    }

    #[test]
    fn test_all_undecodable_is_idle_with_warnings() {
        let app = FaceDetectionApp::new(Arc::new(OneFace));
        let page = app
            .run(&Blobs(vec![UploadedBlob::new("bad.png", b"nope".to_vec())]), &NoProgress)
            .unwrap();

        assert_eq!(page.stage(), Stage::Idle);
        assert_eq!(page.notices()[0].severity, Severity::Warning);
        assert_eq!(page.notices()[1].severity, Severity::Info);
    }

    #[test]
    fn test_displayed_gallery() {
        let app = FaceDetectionApp::new(Arc::new(OneFace));
        let page = app
            .run(&Blobs(vec![png("a.png"), png("b.png")]), &NoProgress)
            .unwrap();

        assert_eq!(page.stage(), Stage::Displayed);
        assert!(page.notices().is_empty());
        let gallery = page.gallery();
        assert_eq!(gallery.len(), 2);
        assert_eq!(gallery[0].source, "a.png");
        assert_eq!(gallery[1].image.caption(), "Detected Faces - Image 2");
        assert_eq!(gallery[0].detections.len(), 1);
        // Pure green reads the same in either channel order.
        assert_eq!(gallery[0].image.image().get_pixel(1, 1).0, [0, 255, 0]);
    }

    #[test]
    fn test_detector_failure_propagates() {
        let app = FaceDetectionApp::new(Arc::new(Broken));
        let err = app.run(&Blobs(vec![png("a.png")]), &NoProgress).unwrap_err();
        assert!(format!("{err:#}").contains("model exploded"));
        assert!(format!("{err:#}").contains("a.png"));
    }

    #[test]
    fn test_runs_are_independent() {
        let app = FaceDetectionApp::new(Arc::new(OneFace));
        let first = app.run(&Blobs(vec![png("a.png")]), &NoProgress).unwrap();
        let second = app.run(&Blobs(vec![]), &NoProgress).unwrap();

        assert_eq!(first.stage(), Stage::Displayed);
        assert_eq!(second.stage(), Stage::Idle);
    }
}
