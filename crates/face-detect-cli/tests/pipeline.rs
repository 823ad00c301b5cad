//! End-to-end tests for the `detect` command.
//!
//! These run without model weights: batches that decode nothing never load
//! the detector, and batches that do exercise the missing/invalid model paths.

#![allow(clippy::unwrap_used, deprecated)]

mod common;

use common::Sandbox;
use face_detect_test_support::SyntheticImageBuilder;
use predicates::prelude::*;

#[test]
fn test_undecodable_upload_is_skipped_with_warning() {
    let sandbox = Sandbox::new();
    sandbox.put(&SyntheticImageBuilder::truncated_png("broken.png"));

    sandbox
        .cmd()
        .args(["detect", "broken.png"])
        .assert()
        .code(0)
        .stderr(predicate::str::contains("Skipping broken.png"));

    let html = sandbox.read("faces.html");
    assert!(html.contains("Failed to decode the image: broken.png"));
    assert!(html.contains("Upload one or more images to see face detection in action!"));
    assert!(!html.contains("<figure>"));
}

#[test]
fn test_gallery_written_to_output_path() {
    let sandbox = Sandbox::new();
    sandbox.put(&SyntheticImageBuilder::garbage("notes.png"));

    sandbox
        .cmd()
        .args(["detect", "--output", "out/gallery.html", "notes.png"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to write"));

    std::fs::create_dir_all(sandbox.path().join("out")).unwrap();
    sandbox
        .cmd()
        .args(["detect", "-o", "out/gallery.html", "notes.png"])
        .assert()
        .code(0);

    let html = sandbox.read("out/gallery.html");
    assert!(html.contains("<title>Face Detection - BlazeFace Classifier</title>"));
    // The batch page has no upload form
    assert!(!html.contains("<form"));
}

#[test]
fn test_directory_upload_order_is_sorted() {
    let sandbox = Sandbox::new();
    sandbox.put(&SyntheticImageBuilder::empty("batch/b.png"));
    sandbox.put(&SyntheticImageBuilder::garbage("batch/a.jpg"));
    sandbox.put(&SyntheticImageBuilder::garbage("batch/skip.txt"));

    sandbox
        .cmd()
        .args(["detect", "batch"])
        .assert()
        .code(0);

    let html = sandbox.read("faces.html");
    let a = html.find("a.jpg").unwrap();
    let b = html.find("b.png").unwrap();
    assert!(a < b, "warnings follow upload order");
    assert!(!html.contains("skip.txt"));
}

#[test]
fn test_decodable_image_without_weights_fails() {
    let sandbox = Sandbox::new();
    sandbox.put(&SyntheticImageBuilder::jpeg("face.jpg", 64, 64, [200, 160, 120]));
    sandbox.put(&SyntheticImageBuilder::truncated_png("broken.png"));

    sandbox
        .cmd()
        .args(["detect", "face.jpg", "broken.png"])
        .assert()
        .code(2)
        .stderr(
            predicate::str::contains("Face detection failed for face.jpg")
                .and(predicate::str::contains("BlazeFace weights not found"))
                .and(predicate::str::contains("models fetch")),
        );
}

#[test]
fn test_invalid_weights_file_fails() {
    let sandbox = Sandbox::new();
    sandbox.put(&SyntheticImageBuilder::black_png("face.png", 100, 100));
    std::fs::write(
        sandbox.models_dir().join("blazeface.safetensors"),
        b"not a safetensors file",
    )
    .unwrap();

    sandbox
        .cmd()
        .args(["detect", "face.png"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Failed to load BlazeFace weights"));
}

#[test]
fn test_models_dir_flag_is_used() {
    let sandbox = Sandbox::new();
    sandbox.put(&SyntheticImageBuilder::black_png("face.png", 16, 16));

    sandbox
        .cmd()
        .args(["detect", "--models-dir", "elsewhere", "face.png"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("elsewhere"));
}

#[test]
fn test_recursive_flag() {
    let sandbox = Sandbox::new();
    sandbox.put(&SyntheticImageBuilder::garbage("root/top.png"));
    sandbox.put(&SyntheticImageBuilder::garbage("root/nested/deep.png"));

    sandbox.cmd().args(["detect", "root"]).assert().code(0);
    let html = sandbox.read("faces.html");
    assert!(html.contains("top.png"));
    assert!(!html.contains("deep.png"));

    sandbox.cmd().args(["detect", "-r", "root"]).assert().code(0);
    let html = sandbox.read("faces.html");
    assert!(html.contains("deep.png"));
}
