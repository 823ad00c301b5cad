//! Locating and loading the `BlazeFace` weights.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use face_detect_adapters::models;
use face_detect_core::inference::{BlazeFaceConfig, BlazeFaceDetector, DevicePreference};
use face_detect_core::{Bitmap, Detection, FaceDetector};
use tracing::debug;

const BLAZEFACE_FILE: &str = "blazeface.safetensors";

/// Everything needed to construct the production detector.
#[derive(Debug, Clone)]
pub struct DetectorSettings {
    /// Directory holding `blazeface.safetensors`.
    pub models_dir: PathBuf,
    /// Score and NMS thresholds.
    pub config: BlazeFaceConfig,
    /// Device choice.
    pub device: DevicePreference,
}

impl DetectorSettings {
    /// Path the weights are expected at.
    #[must_use]
    pub fn weights_path(&self) -> PathBuf {
        self.models_dir.join(BLAZEFACE_FILE)
    }

    /// Loads the detector, failing early with a hint when weights are missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the weights are absent or cannot be loaded.
    pub fn load(&self) -> Result<BlazeFaceDetector> {
        let path = self.weights_path();
        ensure_present(&path)?;
        BlazeFaceDetector::load(&path, self.config, self.device)
    }
}

fn ensure_present(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!(
            "BlazeFace weights not found at {}. Run `face-detect models fetch --url <URL>` \
             or set [models] blazeface_url in {}.",
            path.display(),
            crate::config::PROJECT_CONFIG_FILE
        );
    }
    Ok(())
}

/// Detector that loads its weights on first use.
///
/// Lets `detect` finish batches with nothing decodable without needing
/// model files on disk.
pub struct LazyDetector {
    settings: DetectorSettings,
    loaded: Mutex<Option<Arc<BlazeFaceDetector>>>,
}

impl LazyDetector {
    #[must_use]
    pub const fn new(settings: DetectorSettings) -> Self {
        Self {
            settings,
            loaded: Mutex::new(None),
        }
    }

    fn get(&self) -> Result<Arc<BlazeFaceDetector>> {
        let mut slot = self
            .loaded
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
        if let Some(detector) = slot.as_ref() {
            return Ok(Arc::clone(detector));
        }
        debug!("Loading detector on first use");
        let detector = Arc::new(self.settings.load()?);
        *slot = Some(Arc::clone(&detector));
        Ok(detector)
    }
}

impl FaceDetector for LazyDetector {
    fn name(&self) -> &'static str {
        "blazeface"
    }

    fn detect(&self, bitmap: &Bitmap) -> Result<Vec<Detection>> {
        self.get()?.detect(bitmap)
    }
}

/// Resolves the models directory: explicit override, else the default.
#[must_use]
pub fn resolve_models_dir(override_dir: Option<&Path>) -> PathBuf {
    override_dir.map_or_else(models::models_dir, Path::to_path_buf)
}
