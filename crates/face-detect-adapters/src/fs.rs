//! Filesystem adapter that treats image files as uploads.

use anyhow::{Context, Result};
use face_detect_core::{UploadSource, UploadedBlob};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extensions accepted by the upload control.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Filesystem upload source adapter.
///
/// Files are delivered in argument order; directory contents are sorted by
/// path so repeated runs see the same upload order. The file list is fixed
/// when the source is created.
pub struct FsUploadSource {
    files: Vec<PathBuf>,
}

impl FsUploadSource {
    /// Creates a new filesystem upload source, scanning `paths` once.
    ///
    /// # Arguments
    ///
    /// * `paths` - Files or directories to scan
    /// * `recursive` - Whether to recurse into subdirectories
    #[must_use]
    pub fn new(paths: &[PathBuf], recursive: bool) -> Self {
        let files = collect_files(paths, recursive);
        debug!("Found {} image files", files.len());
        Self { files }
    }
}

/// Collects all supported files from `paths`.
fn collect_files(paths: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            if is_supported_image(path) {
                files.push(path.clone());
            } else {
                warn!("Unsupported file type: {}", path.display());
            }
        } else if path.is_dir() {
            collect_from_dir(path, recursive, &mut files);
        } else {
            warn!("Path does not exist: {}", path.display());
        }
    }

    files
}

fn collect_from_dir(dir: &Path, recursive: bool, files: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!("Failed to read directory {}: {e}", dir.display());
            return;
        }
    };

    let mut paths: Vec<PathBuf> = entries.flatten().map(|entry| entry.path()).collect();
    paths.sort();

    for path in paths {
        if path.is_file() && is_supported_image(&path) {
            files.push(path);
        } else if path.is_dir() && recursive {
            collect_from_dir(&path, recursive, files);
        }
    }
}

impl UploadSource for FsUploadSource {
    fn uploads(&self) -> Box<dyn Iterator<Item = Result<UploadedBlob>> + Send + '_> {
        Box::new(self.files.iter().map(|path| read_upload(path)))
    }

    fn count_hint(&self) -> Option<usize> {
        Some(self.files.len())
    }
}

/// Checks if a path has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .is_some_and(|e| SUPPORTED_EXTENSIONS.contains(&e.as_str()))
}

/// Reads a file's bytes without decoding them.
fn read_upload(path: &Path) -> Result<UploadedBlob> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(UploadedBlob::new(path.to_string_lossy(), bytes))
}
