//! Raw uploaded files.

/// An uploaded file: its name and undecoded bytes.
///
/// Lives for one interaction only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedBlob {
    /// File name as supplied by the user (or path, for filesystem sources).
    pub name: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

impl UploadedBlob {
    /// Creates a new blob.
    #[must_use]
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}
