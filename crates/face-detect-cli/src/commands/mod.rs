//! CLI command definitions and handlers.

pub mod detect;
pub mod models;
pub mod serve;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use face_detect_core::inference::{BlazeFaceConfig, DevicePreference};

use crate::config::AppConfig;
use crate::detector::{resolve_models_dir, DetectorSettings};

/// Face Detect - outline faces in uploaded images
#[derive(Parser)]
#[command(name = "face-detect")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Defaults to `serve` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Run the browser demo
    Serve(serve::ServeArgs),
    /// Detect faces in image files and write an HTML gallery
    Detect(detect::DetectArgs),
    /// Manage ML models
    Models(models::ModelsArgs),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Finished, with or without faces.
    Success = 0,
    /// Something failed.
    Error = 2,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code as u8)
    }
}

/// Hardcoded default values.
mod defaults {
    pub const SCORE_THRESHOLD: f32 = 0.75;
    pub const NMS_THRESHOLD: f32 = 0.3;
}

/// Parse and validate a threshold value (0.0-1.0).
fn parse_threshold(s: &str) -> Result<f32, String> {
    let value: f32 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{value} is not in 0.0..=1.0"))
    }
}

/// Detector options shared by `serve` and `detect`.
#[derive(Args, Clone, Default)]
pub struct DetectorArgs {
    /// Minimum face score (0.0-1.0)
    #[arg(long, value_parser = parse_threshold)]
    pub score_threshold: Option<f32>,

    /// IoU above which overlapping faces are merged (0.0-1.0)
    #[arg(long, value_parser = parse_threshold)]
    pub nms_threshold: Option<f32>,

    /// Custom models directory (overrides default and config)
    #[arg(long, value_name = "DIR")]
    pub models_dir: Option<PathBuf>,

    /// Run inference on the CPU even if a GPU is available
    #[arg(long)]
    pub cpu: bool,
}

impl DetectorArgs {
    /// Fills unset options from config; CLI values win.
    pub fn apply_config(&mut self, config: &AppConfig) {
        self.score_threshold = self.score_threshold.or(config.detector.score_threshold);
        self.nms_threshold = self.nms_threshold.or(config.detector.nms_threshold);
        if self.models_dir.is_none() {
            self.models_dir.clone_from(&config.models.dir);
        }
    }

    /// Resolves settings, falling back to hardcoded defaults.
    #[must_use]
    pub fn settings(&self) -> DetectorSettings {
        DetectorSettings {
            models_dir: resolve_models_dir(self.models_dir.as_deref()),
            config: BlazeFaceConfig {
                score_threshold: self.score_threshold.unwrap_or(defaults::SCORE_THRESHOLD),
                nms_threshold: self.nms_threshold.unwrap_or(defaults::NMS_THRESHOLD),
            },
            device: if self.cpu {
                DevicePreference::Cpu
            } else {
                DevicePreference::Auto
            },
        }
    }
}
