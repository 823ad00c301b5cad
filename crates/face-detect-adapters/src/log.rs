//! Progress sink that reports through `tracing`.

use face_detect_core::{ProgressEvent, ProgressSink};
use tracing::{debug, info};

/// Logs pipeline progress; used where there is no terminal to draw on.
///
/// Decode failures are already logged at `warn` during acquisition, so
/// skips are only traced at `debug` here.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Acquired { name, index, total } => {
                debug!(index, ?total, "Decoded {name}");
            }
            ProgressEvent::Skipped { name, reason } => {
                debug!("Skipped {name}: {reason}");
            }
            ProgressEvent::Annotated { name, index, faces } => {
                debug!(index, faces, "Annotated {name}");
            }
            ProgressEvent::Finished { displayed, skipped } => {
                info!(displayed, skipped, "Request processed");
            }
        }
    }
}
