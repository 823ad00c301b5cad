//! Integration tests for configuration layering.
//!
//! Tests the full priority chain: hardcoded defaults < XDG config < project config < CLI args

#![allow(clippy::unwrap_used)] // Test code uses unwrap for brevity
#![allow(deprecated)] // cargo_bin deprecation warning

mod common;

use common::Sandbox;
use face_detect_test_support::SyntheticImageBuilder;
use predicates::prelude::*;

/// A sandbox holding one undecodable upload, so `detect` never needs weights.
fn sandbox_with_broken_upload() -> Sandbox {
    let sandbox = Sandbox::new();
    sandbox.put(&SyntheticImageBuilder::truncated_png("broken.png"));
    sandbox
}

#[test]
fn test_project_config_applies_format() {
    let sandbox = sandbox_with_broken_upload();
    sandbox.project_config(
        r"
[output]
format = 'json'
",
    );

    sandbox
        .cmd()
        .args(["detect", "broken.png"])
        .assert()
        .code(0)
        .stdout("[]\n");
}

#[test]
fn test_cli_overrides_project_config() {
    let sandbox = sandbox_with_broken_upload();
    sandbox.project_config(
        r"
[output]
format = 'json'
",
    );

    // JSONL with nothing displayed prints nothing at all
    sandbox
        .cmd()
        .args(["detect", "--format", "jsonl", "broken.png"])
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_xdg_config_is_lowest_priority() {
    let sandbox = sandbox_with_broken_upload();
    let xdg = sandbox.path().join("config/face-detect");
    std::fs::create_dir_all(&xdg).unwrap();
    std::fs::write(
        xdg.join("config.toml"),
        r"
[models]
dir = '/from/xdg'
",
    )
    .unwrap();

    sandbox
        .cmd()
        .args(["models", "path"])
        .assert()
        .success()
        .stdout("/from/xdg\n");

    sandbox.project_config(
        r"
[models]
dir = '/from/project'
",
    );

    sandbox
        .cmd()
        .args(["models", "path"])
        .assert()
        .success()
        .stdout("/from/project\n");
}

#[test]
fn test_project_config_found_in_parent_directory() {
    let sandbox = Sandbox::new();
    sandbox.project_config(
        r"
[models]
dir = '/from/parent'
",
    );
    let nested = sandbox.path().join("a/b");
    std::fs::create_dir_all(&nested).unwrap();

    sandbox
        .cmd()
        .current_dir(&nested)
        .args(["models", "path"])
        .assert()
        .success()
        .stdout("/from/parent\n");
}

#[test]
fn test_config_models_dir_used_by_detect() {
    let sandbox = Sandbox::new();
    let image = sandbox.put(&SyntheticImageBuilder::black_png("face.png", 32, 32));
    sandbox.project_config(
        r"
[models]
dir = 'configured-models'
",
    );

    sandbox
        .cmd()
        .arg("detect")
        .arg(image)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("configured-models"));
}

#[test]
fn test_config_blazeface_url_used_by_fetch() {
    let sandbox = Sandbox::new();
    sandbox.project_config(
        r"
[models]
blazeface_url = 'http://127.0.0.1:9/blazeface.safetensors'
",
    );

    // The URL is taken from config; the download itself fails
    sandbox
        .cmd()
        .args(["models", "fetch"])
        .assert()
        .code(2)
        .stderr(
            predicate::str::contains("Failed to download blazeface")
                .and(predicate::str::contains("No download URL").not()),
        );
}

#[test]
fn test_invalid_config_value_warns() {
    let sandbox = sandbox_with_broken_upload();
    sandbox.project_config(
        r"
[detector]
score_threshold = 3.0
",
    );

    sandbox
        .cmd()
        .args(["detect", "broken.png"])
        .assert()
        .code(0)
        .stderr(predicate::str::contains(
            "warning: detector.score_threshold must be 0.0-1.0",
        ));
}

#[test]
fn test_unparsable_config_is_ignored() {
    let sandbox = sandbox_with_broken_upload();
    sandbox.project_config("[output\nformat = 'json'");

    // Falls back to the JSONL default
    sandbox
        .cmd()
        .args(["detect", "broken.png"])
        .assert()
        .code(0)
        .stdout(predicate::str::is_empty());
}
