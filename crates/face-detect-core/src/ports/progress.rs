//! Progress reporting port for UI integration.

/// Events emitted while a batch moves through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// An upload decoded successfully.
    Acquired {
        /// Upload name.
        name: String,
        /// Index in the upload batch (0-based).
        index: usize,
        /// Total uploads in batch, if known.
        total: Option<usize>,
    },
    /// An upload was skipped.
    Skipped {
        /// Upload name.
        name: String,
        /// Reason for skipping.
        reason: String,
    },
    /// Detection and annotation finished for one image.
    Annotated {
        /// Upload name.
        name: String,
        /// Position in the gallery (0-based).
        index: usize,
        /// Number of faces drawn.
        faces: usize,
    },
    /// The interaction is done.
    Finished {
        /// Images displayed.
        displayed: usize,
        /// Uploads skipped.
        skipped: usize,
    },
}

/// Port for receiving progress events.
pub trait ProgressSink: Send + Sync {
    /// Called when a progress event occurs.
    fn on_event(&self, event: ProgressEvent);
}

/// Sink that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_event(&self, _event: ProgressEvent) {}
}
