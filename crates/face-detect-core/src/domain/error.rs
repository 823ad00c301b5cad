//! Codec error types.

use thiserror::Error;

/// Why an uploaded blob could not be decoded into a [`super::Bitmap`].
///
/// Always recoverable at the batch level: the blob is skipped.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The blob had no bytes.
    #[error("image data is empty")]
    Empty,

    /// The format was not recognised or is not supported.
    #[error("unsupported image format: {0}")]
    Unsupported(String),

    /// The format was recognised but the data is corrupt or truncated.
    #[error("malformed image data: {0}")]
    Malformed(String),

    /// The image decoded to zero width or height.
    #[error("image dimensions are zero")]
    ZeroDimensions,
}
