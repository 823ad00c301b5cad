//! Detect command - run the pipeline over image files.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use face_detect_adapters::{render_page, FsUploadSource, PageOptions};
use face_detect_core::{
    FaceDetectionApp, FaceDetector, ImageReport, Page, ReportOutput, Severity, UploadSource,
};
use tracing::{debug, info};

use super::{DetectorArgs, ExitCode};
use crate::config::AppConfig;
use crate::detector::LazyDetector;
use crate::output::{JsonOutput, ProgressBar};

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON Lines (one JSON object per line)
    #[default]
    Jsonl,
    /// Single JSON array
    Json,
}

const DEFAULT_OUTPUT: &str = "faces.html";

/// Arguments for the detect command.
#[derive(Args, Clone)]
pub struct DetectArgs {
    /// Image files or directories (.jpg, .jpeg, .png)
    pub paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Where to write the HTML gallery
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Pretty-print JSON output (only affects --format json)
    #[arg(long)]
    pub pretty: bool,

    /// Show progress bar
    #[arg(long)]
    pub progress: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub detector: DetectorArgs,
}

impl DetectArgs {
    /// Apply configuration file values, respecting CLI precedence.
    ///
    /// Layering priority (lowest to highest):
    /// 1. Hardcoded defaults (in accessor methods)
    /// 2. Config file values (XDG, then project-local)
    /// 3. CLI arguments (already set on self)
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        if self.format.is_none() {
            self.format = config
                .output
                .format
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "json" => Some(OutputFormat::Json),
                    "jsonl" => Some(OutputFormat::Jsonl),
                    _ => None,
                });
        }

        // Boolean output options: CLI flag wins, then config
        if !self.pretty {
            self.pretty = config.output.pretty.unwrap_or(false);
        }
        if !self.progress {
            self.progress = config.output.progress.unwrap_or(false);
        }

        self.detector.apply_config(config);
        self
    }

    /// Get output format with fallback to JSONL.
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }

    /// Get gallery path with fallback to `faces.html`.
    fn output(&self) -> &Path {
        self.output
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_OUTPUT))
    }
}

/// Result of running the detect command.
pub struct DetectOutcome {
    /// Number of images shown in the gallery.
    pub displayed: usize,
    /// Total faces across the gallery.
    pub faces: usize,
    /// Exit code.
    pub exit_code: ExitCode,
}

/// Run the detect command.
///
/// Expects `args` to have been processed through `with_config()` first.
pub fn run(args: &DetectArgs) -> Result<DetectOutcome> {
    info!("Running detect command on {} paths", args.paths.len());

    if args.paths.is_empty() {
        anyhow::bail!("No paths specified");
    }

    let source = FsUploadSource::new(&args.paths, args.recursive);
    let total = source.count_hint();

    let show_progress = !args.quiet && (args.progress || std::io::stderr().is_terminal());
    let progress_bar = ProgressBar::new(total.map(|t| t as u64), args.quiet, show_progress);

    let settings = args.detector.settings();
    debug!("Models directory: {}", settings.models_dir.display());
    let detector: Arc<dyn FaceDetector> = Arc::new(LazyDetector::new(settings));
    let app = FaceDetectionApp::new(detector);

    let page = app.run(&source, &progress_bar)?;

    let path = args.output();
    write_gallery(&page, path)?;
    info!("Wrote {}", path.display());

    write_reports(&page, &JsonOutput::stdout(), args)?;

    let failed = page
        .notices()
        .iter()
        .filter(|n| n.severity == Severity::Error)
        .inspect(|n| eprintln!("error: {n}"))
        .count();

    Ok(DetectOutcome {
        displayed: page.gallery().len(),
        faces: page.gallery().iter().map(|d| d.detections.len()).sum(),
        exit_code: if failed > 0 {
            ExitCode::Error
        } else {
            ExitCode::Success
        },
    })
}

fn write_gallery(page: &Page, path: &Path) -> Result<()> {
    let html = render_page(
        page,
        PageOptions {
            show_upload_form: false,
        },
    )?;
    std::fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))
}

fn write_reports(page: &Page, output: &JsonOutput, args: &DetectArgs) -> Result<()> {
    match args.format() {
        OutputFormat::Jsonl => stream_reports(page, output),
        OutputFormat::Json => {
            let reports: Vec<ImageReport> = page.gallery().iter().map(ImageReport::from).collect();
            output.write_array(&reports, args.pretty)?;
            output.flush()
        }
    }
}

/// Writes one report per gallery image, in gallery order, then flushes.
fn stream_reports(page: &Page, output: &dyn ReportOutput) -> Result<()> {
    for displayed in page.gallery() {
        output.write(&ImageReport::from(displayed))?;
    }
    output.flush()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use face_detect_core::{FaceBox, NoProgress};
    use face_detect_test_support::{
        MockReportOutput, MockUploadSource, StubDetector, SyntheticImageBuilder,
    };

    fn page(uploads: Vec<face_detect_core::UploadedBlob>) -> Page {
        let detector = StubDetector::with_boxes(&[FaceBox::new(2, 2, 6, 6)]);
        let app = FaceDetectionApp::new(Arc::new(detector));
        app.run(&MockUploadSource::new(uploads), &NoProgress).unwrap()
    }

    #[test]
    fn test_stream_reports_in_gallery_order() {
        let page = page(vec![
            SyntheticImageBuilder::black_png("first.png", 16, 16),
            SyntheticImageBuilder::garbage("skipped.png"),
            SyntheticImageBuilder::jpeg("second.jpg", 24, 12, [1, 2, 3]),
        ]);
        let output = MockReportOutput::new();

        stream_reports(&page, &output).unwrap();

        let reports = output.reports();
        let sources: Vec<&str> = reports.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(sources, ["first.png", "second.jpg"]);
        assert_eq!(reports[1].caption, "Detected Faces - Image 2");
        assert_eq!(reports[0].faces[0].bbox, FaceBox::new(2, 2, 6, 6));
        assert_eq!(output.flush_count(), 1);
    }

    #[test]
    fn test_stream_reports_idle_page_only_flushes() {
        let page = page(Vec::new());
        let output = MockReportOutput::new();

        stream_reports(&page, &output).unwrap();

        assert!(output.reports().is_empty());
        assert_eq!(output.flush_count(), 1);
    }

    #[test]
    fn test_output_defaults() {
        let args = DetectArgs {
            paths: vec![],
            recursive: false,
            output: None,
            format: None,
            pretty: false,
            progress: false,
            quiet: false,
            detector: DetectorArgs::default(),
        };
        assert_eq!(args.output(), Path::new("faces.html"));
        assert!(matches!(args.format(), OutputFormat::Jsonl));
    }
}
