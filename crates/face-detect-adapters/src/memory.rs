//! In-memory upload source for blobs received over HTTP.

use anyhow::Result;
use face_detect_core::{UploadSource, UploadedBlob};

/// Upload source backed by blobs already held in memory.
///
/// A source that broke while receiving (for example a truncated multipart
/// body) keeps the blobs read so far and reports the failure after them.
#[derive(Debug, Clone, Default)]
pub struct MemoryUploadSource {
    blobs: Vec<UploadedBlob>,
    failure: Option<String>,
}

impl MemoryUploadSource {
    /// Creates a source that yields `blobs` in order.
    #[must_use]
    pub const fn new(blobs: Vec<UploadedBlob>) -> Self {
        Self {
            blobs,
            failure: None,
        }
    }

    /// Marks the source as failed after its blobs.
    #[must_use]
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Number of blobs held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Whether no blobs are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl UploadSource for MemoryUploadSource {
    fn uploads(&self) -> Box<dyn Iterator<Item = Result<UploadedBlob>> + Send + '_> {
        let failure = self
            .failure
            .as_ref()
            .map(|message| Err(anyhow::anyhow!("{message}")));
        Box::new(self.blobs.iter().cloned().map(Ok).chain(failure))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.blobs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yields_in_order() {
        let source = MemoryUploadSource::new(vec![
            UploadedBlob::new("a.png", vec![1]),
            UploadedBlob::new("b.png", vec![2]),
        ]);

        let names: Vec<String> = source
            .uploads()
            .filter_map(Result::ok)
            .map(|b| b.name)
            .collect();
        assert_eq!(names, ["a.png", "b.png"]);
        assert_eq!(source.count_hint(), Some(2));
    }

    #[test]
    fn test_failure_comes_last() {
        let source = MemoryUploadSource::new(vec![UploadedBlob::new("a.png", vec![1])])
            .with_failure("stream closed");

        let items: Vec<_> = source.uploads().collect();
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(items[1]
            .as_ref()
            .is_err_and(|e| e.to_string() == "stream closed"));
    }

    #[test]
    fn test_default_is_empty() {
        let source = MemoryUploadSource::default();
        assert!(source.is_empty());
        assert_eq!(source.uploads().count(), 0);
    }
}
