//! Model downloading and caching adapter.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable that overrides the models directory.
pub const MODELS_DIR_ENV: &str = "FACE_DETECT_MODELS_DIR";

/// Model metadata.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Model name/identifier.
    pub name: &'static str,
    /// Filename in models directory.
    pub filename: &'static str,
    /// One-line description for `models list`.
    pub description: &'static str,
}

/// Known models.
pub const MODELS: &[ModelInfo] = &[ModelInfo {
    name: "blazeface",
    filename: "blazeface.safetensors",
    description: "BlazeFace short-range face detector (128x128)",
}];

/// Download progress callback: model name, bytes so far, total if known.
pub type ProgressCallback = Box<dyn Fn(&str, u64, Option<u64>) + Send + Sync>;

/// Returns the models directory path.
///
/// Uses `$FACE_DETECT_MODELS_DIR` when set, otherwise
/// `XDG_DATA_HOME/face-detect/models` or `~/.local/share/face-detect/models`.
#[must_use]
pub fn models_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(MODELS_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("face-detect")
        .join("models")
}

/// Looks up a known model by name.
#[must_use]
pub fn find_model(name: &str) -> Option<&'static ModelInfo> {
    MODELS.iter().find(|m| m.name == name)
}

/// Returns the path to a specific model file inside `dir`.
#[must_use]
pub fn model_path(dir: &Path, name: &str) -> Option<PathBuf> {
    find_model(name).map(|m| dir.join(m.filename))
}

/// Lists known models with their install status in `dir`.
#[must_use]
pub fn list_models(dir: &Path) -> Vec<(&'static ModelInfo, bool)> {
    MODELS
        .iter()
        .map(|m| (m, dir.join(m.filename).exists()))
        .collect()
}

/// Downloads `model` from `url` into `dir`, returning the installed path.
///
/// The body is streamed to a `.part` file which is renamed into place only
/// after the checksum (if given) matches.
///
/// # Errors
///
/// Returns an error if:
/// - The models directory cannot be created
/// - The download fails or returns a non-success status
/// - The checksum doesn't match
pub fn fetch_model(
    model: &ModelInfo,
    url: &str,
    expected_sha256: Option<&str>,
    dir: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create models directory {}", dir.display()))?;

    info!("Downloading model {} from {url}", model.name);

    let mut response = reqwest::blocking::get(url)
        .with_context(|| format!("Failed to download {}", model.name))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status: {}", response.status());
    }

    let total = response.content_length();
    install_from_reader(model, &mut response, total, expected_sha256, dir, progress)
}

/// Streams `reader` into `<dir>/<filename>.part`, verifies it and renames it
/// into place. The partial file is removed on every failure.
fn install_from_reader(
    model: &ModelInfo,
    reader: &mut impl Read,
    total: Option<u64>,
    expected_sha256: Option<&str>,
    dir: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<PathBuf> {
    let path = dir.join(model.filename);
    let partial = dir.join(format!("{}.part", model.filename));

    let downloaded = match write_partial(model, reader, total, expected_sha256, &partial, progress) {
        Ok(n) => n,
        Err(e) => {
            if let Err(rm) = fs::remove_file(&partial) {
                debug!("No partial file to remove at {}: {rm}", partial.display());
            }
            return Err(e);
        }
    };

    fs::rename(&partial, &path)
        .with_context(|| format!("Failed to install {}", path.display()))?;

    info!("Downloaded {} ({downloaded} bytes)", model.name);
    Ok(path)
}

fn write_partial(
    model: &ModelInfo,
    reader: &mut impl Read,
    total: Option<u64>,
    expected_sha256: Option<&str>,
    partial: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<u64> {
    let mut file = fs::File::create(partial)
        .with_context(|| format!("Failed to create {}", partial.display()))?;
    let mut hasher = Sha256::new();
    let mut downloaded = 0u64;
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read response for {}", model.name))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        file.write_all(&buf[..n])
            .with_context(|| format!("Failed to write {}", partial.display()))?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(model.name, downloaded, total);
        }
    }
    file.flush()?;

    let hash = format!("{:x}", hasher.finalize());
    verify_checksum(&hash, expected_sha256).with_context(|| {
        format!("Checksum mismatch for {}; nothing was installed", model.name)
    })?;
    Ok(downloaded)
}

/// Compares a hex digest against the expected one, if any.
///
/// # Errors
///
/// Returns an error when an expected digest is given and differs.
pub fn verify_checksum(actual: &str, expected: Option<&str>) -> Result<()> {
    match expected.map(str::trim) {
        None | Some("") => {
            debug!("No checksum given; skipping verification");
            Ok(())
        }
        Some(expected) if expected.eq_ignore_ascii_case(actual) => Ok(()),
        Some(expected) => anyhow::bail!("expected sha256 {expected}, got {actual}"),
    }
}
