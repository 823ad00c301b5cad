//! ML inference using Candle.
//!
//! Provides the `BlazeFace` network and the [`BlazeFaceDetector`] that plugs
//! it into the pipeline's [`crate::ports::FaceDetector`] port.

mod blazeface;
mod detector;
mod device;
mod loader;

pub use blazeface::{BlazeFace, BlazeFaceConfig, RawFace, INPUT_SIZE, NUM_KEYPOINTS};
pub use detector::BlazeFaceDetector;
pub use device::{select_device, DevicePreference};
pub use loader::load_safetensors;
