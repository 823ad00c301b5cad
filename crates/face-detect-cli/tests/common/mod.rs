//! Shared helpers for CLI integration tests.

#![allow(dead_code, deprecated)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use face_detect_core::UploadedBlob;
use tempfile::TempDir;

/// An isolated working directory: no user config, no installed models.
pub struct Sandbox {
    pub root: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("config")).unwrap();
        std::fs::create_dir_all(root.path().join("models")).unwrap();
        Self { root }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn models_dir(&self) -> PathBuf {
        self.path().join("models")
    }

    /// Writes an upload into the sandbox and returns its path.
    pub fn put(&self, blob: &UploadedBlob) -> PathBuf {
        let path = self.path().join(&blob.name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, &blob.bytes).unwrap();
        path
    }

    /// Writes `.face-detect.toml` into the sandbox root.
    pub fn project_config(&self, toml: &str) {
        std::fs::write(self.path().join(".face-detect.toml"), toml).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path().join(rel)).unwrap()
    }

    /// `face-detect` running inside the sandbox.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("face-detect").unwrap();
        cmd.current_dir(self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("FACE_DETECT_MODELS_DIR", self.models_dir());
        cmd
    }
}
