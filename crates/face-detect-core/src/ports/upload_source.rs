//! Upload source port for delivering uploaded files.

use crate::domain::UploadedBlob;

/// Port for delivering the files of one interaction, in upload order.
pub trait UploadSource: Send + Sync {
    /// Returns an iterator over the uploaded blobs.
    ///
    /// # Errors
    ///
    /// An `Err` item means the source itself failed (not that the bytes are
    /// undecodable); acquisition abandons the whole batch when it sees one.
    fn uploads(&self) -> Box<dyn Iterator<Item = anyhow::Result<UploadedBlob>> + Send + '_>;

    /// Returns the number of uploads, if known.
    fn count_hint(&self) -> Option<usize>;
}
