//! Mock implementations of core port traits.

use std::sync::{Arc, Mutex, PoisonError};

use face_detect_core::{
    Bitmap, Detection, FaceBox, FaceDetector, ImageReport, ProgressEvent, ProgressSink,
    ReportOutput, UploadSource, UploadedBlob,
};

/// Stub detector oracle that returns the same detections for every bitmap.
///
/// Records the dimensions of every bitmap it was asked about.
pub struct StubDetector {
    detections: Vec<Detection>,
    calls: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl StubDetector {
    /// Returns `detections` for every call.
    #[must_use]
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns one box-only detection per box.
    #[must_use]
    pub fn with_boxes(boxes: &[FaceBox]) -> Self {
        Self::new(boxes.iter().copied().map(Detection::from_box).collect())
    }

    /// Never finds a face.
    #[must_use]
    pub fn no_faces() -> Self {
        Self::new(Vec::new())
    }

    /// Parses detector records such as `[{"box":[10,10,30,30]}]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not match the record format.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Number of `detect` calls so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Dimensions of each bitmap passed to `detect`, in call order.
    #[must_use]
    pub fn seen_dimensions(&self) -> Vec<(u32, u32)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FaceDetector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&self, bitmap: &Bitmap) -> anyhow::Result<Vec<Detection>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(bitmap.dimensions());
        Ok(self.detections.clone())
    }
}

/// Detector that always fails.
pub struct FailingDetector {
    message: String,
}

impl FailingDetector {
    /// Fails every call with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl FaceDetector for FailingDetector {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn detect(&self, _bitmap: &Bitmap) -> anyhow::Result<Vec<Detection>> {
        anyhow::bail!("{}", self.message)
    }
}

/// Mock implementation of `UploadSource` for testing.
///
/// Yields pre-built blobs; can be told to fail at a given position.
pub struct MockUploadSource {
    uploads: Vec<UploadedBlob>,
    fail_at: Option<usize>,
    iteration_count: Arc<Mutex<usize>>,
}

impl MockUploadSource {
    /// Creates a new mock source with the given uploads.
    #[must_use]
    pub fn new(uploads: Vec<UploadedBlob>) -> Self {
        Self {
            uploads,
            fail_at: None,
            iteration_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Creates an empty mock source.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(vec![])
    }

    /// Makes the source fail when it reaches position `index`.
    #[must_use]
    pub const fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Returns the number of times the source has been iterated.
    #[must_use]
    pub fn iteration_count(&self) -> usize {
        *self
            .iteration_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl UploadSource for MockUploadSource {
    fn uploads(&self) -> Box<dyn Iterator<Item = anyhow::Result<UploadedBlob>> + Send + '_> {
        if let Ok(mut c) = self.iteration_count.lock() {
            *c += 1;
        }
        let fail_at = self.fail_at;
        Box::new(self.uploads.iter().enumerate().map(move |(i, blob)| {
            if fail_at == Some(i) {
                Err(anyhow::anyhow!("upload stream interrupted"))
            } else {
                Ok(blob.clone())
            }
        }))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.uploads.len())
    }
}

/// Mock implementation of `ReportOutput` for testing.
///
/// Captures reports for later assertions.
pub struct MockReportOutput {
    reports: Arc<Mutex<Vec<ImageReport>>>,
    flush_count: Arc<Mutex<usize>>,
}

impl MockReportOutput {
    /// Creates a new mock output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            reports: Arc::new(Mutex::new(Vec::new())),
            flush_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Returns all captured reports.
    #[must_use]
    pub fn reports(&self) -> Vec<ImageReport> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of times `flush()` was called.
    #[must_use]
    pub fn flush_count(&self) -> usize {
        *self
            .flush_count
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockReportOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportOutput for MockReportOutput {
    fn write(&self, report: &ImageReport) -> anyhow::Result<()> {
        self.reports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }

    fn flush(&self) -> anyhow::Result<()> {
        if let Ok(mut c) = self.flush_count.lock() {
            *c += 1;
        }
        Ok(())
    }
}

/// Mock implementation of `ProgressSink` for testing.
///
/// Captures events for later assertions.
pub struct MockProgressSink {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl MockProgressSink {
    /// Creates a new mock progress sink.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns all captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of `Acquired` events.
    #[must_use]
    pub fn acquired_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Acquired { .. }))
            .count()
    }

    /// Returns the number of `Skipped` events.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Skipped { .. }))
            .count()
    }

    /// Returns the number of `Annotated` events.
    #[must_use]
    pub fn annotated_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Annotated { .. }))
            .count()
    }

    /// Returns the final counts from the `Finished` event, if any.
    #[must_use]
    pub fn finished_counts(&self) -> Option<(usize, usize)> {
        self.events().iter().find_map(|e| match e {
            ProgressEvent::Finished { displayed, skipped } => Some((*displayed, *skipped)),
            _ => None,
        })
    }
}

impl Default for MockProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for MockProgressSink {
    fn on_event(&self, event: ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
