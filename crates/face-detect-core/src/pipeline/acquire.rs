//! Image acquisition: uploaded blobs to decoded bitmaps.

use tracing::{debug, warn};

use crate::domain::{Bitmap, Notice, UploadedBlob};
use crate::ports::{ProgressEvent, ProgressSink, UploadSource};

/// A successfully decoded upload.
#[derive(Debug, Clone)]
pub struct AcquiredImage {
    /// Upload name.
    pub name: String,
    /// Decoded pixels.
    pub bitmap: Bitmap,
}

/// Outcome of acquiring one batch.
#[derive(Debug, Default)]
pub struct Acquisition {
    /// Decoded images, in upload order.
    pub images: Vec<AcquiredImage>,
    /// Warnings and errors to show the user.
    pub notices: Vec<Notice>,
    /// Number of uploads that were skipped.
    pub skipped: usize,
}

impl Acquisition {
    /// True when there is nothing to run detection on.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Decodes every upload from `source`, preserving order.
///
/// Undecodable uploads are reported and skipped. If the source itself fails,
/// everything decoded so far is dropped and an error notice is added; the
/// batch then yields no images.
pub fn acquire(source: &dyn UploadSource, progress: &dyn ProgressSink) -> Acquisition {
    let total = source.count_hint();
    let mut acquisition = Acquisition::default();

    for (index, upload) in source.uploads().enumerate() {
        let UploadedBlob { name, bytes } = match upload {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Upload source failed at item {index}: {e:#}");
                acquisition.skipped += acquisition.images.len() + 1;
                acquisition.images.clear();
                acquisition.notices.push(Notice::acquisition_failed(&e));
                return acquisition;
            }
        };

        match Bitmap::decode(&bytes) {
            Ok(bitmap) => {
                debug!(
                    "Decoded {name} ({}x{})",
                    bitmap.width(),
                    bitmap.height()
                );
                progress.on_event(ProgressEvent::Acquired {
                    name: name.clone(),
                    index,
                    total,
                });
                acquisition.images.push(AcquiredImage { name, bitmap });
            }
            Err(e) => {
                warn!("Failed to decode {name}: {e}");
                acquisition.notices.push(Notice::decode_failed(&name));
                progress.on_event(ProgressEvent::Skipped {
                    name,
                    reason: e.to_string(),
                });
                acquisition.skipped += 1;
            }
        }
    }

    acquisition
}
