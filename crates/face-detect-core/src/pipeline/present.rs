//! Presenter: converts annotated bitmaps for display and captions them.

use crate::domain::{Bitmap, GalleryImage};

/// Caption for the image at 0-based gallery position `index`.
#[must_use]
pub fn caption_for(index: usize) -> String {
    format!("Detected Faces - Image {}", index + 1)
}

/// Converts each bitmap to display channel order, in order, with its caption.
pub fn present(bitmaps: impl IntoIterator<Item = Bitmap>) -> Vec<GalleryImage> {
    bitmaps
        .into_iter()
        .enumerate()
        .map(|(index, bitmap)| bitmap.into_display(caption_for(index)))
        .collect()
}
