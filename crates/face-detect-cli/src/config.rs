//! Configuration file support for face-detect.
//!
//! Supports TOML configuration from:
//! - XDG config: `~/.config/face-detect/config.toml` (lowest priority)
//! - Project-local: `.face-detect.toml` (searched up directory tree)
//! - CLI flags (highest priority, applied separately)

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = ".face-detect.toml";

/// Top-level configuration structure.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Web server settings.
    pub server: ServerConfig,
    /// Detector policy.
    pub detector: DetectorConfig,
    /// Model settings.
    pub models: ModelsConfig,
    /// Output formatting settings.
    pub output: OutputConfig,
}

/// Web server configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address, e.g. `127.0.0.1:8501`.
    pub bind: Option<String>,
    /// Request body limit in MiB.
    pub max_upload_mb: Option<u64>,
}

/// Detector configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum face score (0.0-1.0).
    pub score_threshold: Option<f32>,
    /// IoU above which overlapping faces are merged (0.0-1.0).
    pub nms_threshold: Option<f32>,
}

/// Model configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Custom models directory path.
    pub dir: Option<PathBuf>,
    /// Where `models fetch` downloads the `BlazeFace` weights from.
    pub blazeface_url: Option<String>,
}

/// Output formatting configuration.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "json" or "jsonl".
    pub format: Option<String>,
    /// Pretty-print JSON output.
    pub pretty: Option<bool>,
    /// Show progress bar.
    pub progress: Option<bool>,
}

impl AppConfig {
    /// Load configuration from XDG and project-local files.
    ///
    /// Priority (lowest to highest):
    /// 1. XDG config: `~/.config/face-detect/config.toml`
    /// 2. Project-local: `.face-detect.toml` (searched up from cwd)
    ///
    /// Missing files are silently ignored. Invalid values are reported as
    /// warnings and dropped, so the hardcoded default applies instead.
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Some(xdg_path) = xdg_config_path() {
            if xdg_path.exists() {
                info!("Loading XDG config: {}", xdg_path.display());
                if let Some(xdg_config) = load_file(&xdg_path) {
                    config = xdg_config;
                }
            } else {
                debug!("XDG config not found: {}", xdg_path.display());
            }
        }

        if let Some(project_path) = find_project_config() {
            info!("Loading project config: {}", project_path.display());
            if let Some(project_config) = load_file(&project_path) {
                config.merge(project_config);
            }
        }

        for problem in config.validate() {
            eprintln!("warning: {problem}");
        }

        config
    }

    /// Checks values are within acceptable ranges, clearing any that are not.
    ///
    /// Returns one message per rejected value.
    fn validate(&mut self) -> Vec<String> {
        let mut problems = Vec::new();

        reject_outside_unit(
            &mut self.detector.score_threshold,
            "detector.score_threshold",
            &mut problems,
        );
        reject_outside_unit(
            &mut self.detector.nms_threshold,
            "detector.nms_threshold",
            &mut problems,
        );

        if let Some(bind) = &self.server.bind {
            if bind.parse::<SocketAddr>().is_err() {
                problems.push(format!(
                    "server.bind must be an address like 127.0.0.1:8501, got '{bind}'"
                ));
                self.server.bind = None;
            }
        }
        if self.server.max_upload_mb == Some(0) {
            problems.push("server.max_upload_mb must be at least 1".to_string());
            self.server.max_upload_mb = None;
        }

        if let Some(f) = &self.output.format {
            if f != "json" && f != "jsonl" {
                problems.push(format!(
                    "output.format must be 'json' or 'jsonl', got '{f}'"
                ));
                self.output.format = None;
            }
        }

        problems
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` when present.
    fn merge(&mut self, other: Self) {
        // Server
        self.server.bind = other.server.bind.or_else(|| self.server.bind.take());
        self.server.max_upload_mb = other.server.max_upload_mb.or(self.server.max_upload_mb);

        // Detector
        self.detector.score_threshold = other
            .detector
            .score_threshold
            .or(self.detector.score_threshold);
        self.detector.nms_threshold = other
            .detector
            .nms_threshold
            .or(self.detector.nms_threshold);

        // Models
        self.models.dir = other.models.dir.or_else(|| self.models.dir.take());
        self.models.blazeface_url = other
            .models
            .blazeface_url
            .or_else(|| self.models.blazeface_url.take());

        // Output
        self.output.format = other.output.format.or_else(|| self.output.format.take());
        self.output.pretty = other.output.pretty.or(self.output.pretty);
        self.output.progress = other.output.progress.or(self.output.progress);
    }
}

fn reject_outside_unit(value: &mut Option<f32>, key: &str, problems: &mut Vec<String>) {
    if let Some(t) = *value {
        if !(0.0..=1.0).contains(&t) {
            problems.push(format!("{key} must be 0.0-1.0, got {t}"));
            *value = None;
        }
    }
}

/// Get the XDG config file path.
fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("face-detect").join("config.toml"))
}

/// Find project-local config by searching up from current directory.
fn find_project_config() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_in_parents(&cwd)
}

/// Search for `.face-detect.toml` in the given directory and its parents.
fn find_config_in_parents(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);

    while let Some(dir) = current {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        current = dir.parent();
    }

    None
}

/// Load and parse a TOML config file.
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.server.bind.is_none());
        assert!(config.detector.score_threshold.is_none());
        assert!(config.models.blazeface_url.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: AppConfig = toml::from_str("").expect("parse empty config");
        assert!(config.output.format.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r"
[server]
bind = '0.0.0.0:9000'
max_upload_mb = 64

[detector]
score_threshold = 0.6
nms_threshold = 0.4

[models]
dir = '/opt/models'
blazeface_url = 'http://localhost/blazeface.safetensors'

[output]
format = 'json'
pretty = true
progress = false
";
        let config: AppConfig = toml::from_str(toml).expect("parse full config");

        assert_eq!(config.server.bind.as_deref(), Some("0.0.0.0:9000"));
        assert_eq!(config.server.max_upload_mb, Some(64));
        assert_eq!(config.detector.score_threshold, Some(0.6));
        assert_eq!(config.detector.nms_threshold, Some(0.4));
        assert_eq!(config.models.dir, Some(PathBuf::from("/opt/models")));
        assert_eq!(
            config.models.blazeface_url.as_deref(),
            Some("http://localhost/blazeface.safetensors")
        );
        assert_eq!(config.output.format, Some("json".to_string()));
        assert_eq!(config.output.pretty, Some(true));
        assert_eq!(config.output.progress, Some(false));
    }

    #[test]
    fn test_merge_configs() {
        let mut base: AppConfig = toml::from_str(
            r"
[detector]
score_threshold = 0.5

[server]
max_upload_mb = 8
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[detector]
score_threshold = 0.9

[output]
pretty = true
",
        )
        .expect("parse override");

        base.merge(override_config);

        // Overridden
        assert_eq!(base.detector.score_threshold, Some(0.9));
        // Preserved from base
        assert_eq!(base.server.max_upload_mb, Some(8));
        // Added from override
        assert_eq!(base.output.pretty, Some(true));
    }

    #[test]
    fn test_merge_is_per_field() {
        let mut base: AppConfig = toml::from_str(
            r"
[detector]
score_threshold = 0.5
nms_threshold = 0.2
",
        )
        .expect("parse base");

        let override_config: AppConfig = toml::from_str(
            r"
[detector]
nms_threshold = 0.45
",
        )
        .expect("parse override");

        base.merge(override_config);

        assert_eq!(base.detector.score_threshold, Some(0.5));
        assert_eq!(base.detector.nms_threshold, Some(0.45));
    }

    #[test]
    fn test_merge_empty_override_preserves_base() {
        let mut base: AppConfig = toml::from_str(
            r"
[models]
dir = '/models'
",
        )
        .expect("parse base");

        base.merge(AppConfig::default());

        assert_eq!(base.models.dir, Some(PathBuf::from("/models")));
    }

    #[test]
    fn test_invalid_toml_syntax_handled() {
        let toml = r"
[detector
score_threshold = 0.5
";
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "invalid TOML should return error");
    }

    #[test]
    fn test_invalid_field_type_handled() {
        let toml = r#"
[detector]
score_threshold = "high"
"#;
        let result: Result<AppConfig, _> = toml::from_str(toml);
        assert!(result.is_err(), "type mismatch should return error");
    }

    #[test]
    fn test_unknown_section_ignored() {
        let toml = r"
[detector]
score_threshold = 0.5

[blur]
threshold = 0.3
";
        let config: AppConfig = toml::from_str(toml).expect("unknown sections are ignored");
        assert_eq!(config.detector.score_threshold, Some(0.5));
    }

    // === Validation Tests ===

    #[test]
    fn test_validate_threshold_out_of_range() {
        let mut config = AppConfig::default();
        config.detector.score_threshold = Some(1.5);
        config.detector.nms_threshold = Some(0.3);

        let problems = config.validate();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("detector.score_threshold"));
        // Rejected value is dropped, valid one kept
        assert!(config.detector.score_threshold.is_none());
        assert_eq!(config.detector.nms_threshold, Some(0.3));
    }

    #[test]
    fn test_validate_bind_address() {
        let mut config = AppConfig::default();
        config.server.bind = Some("localhost".to_string());

        let problems = config.validate();
        assert!(problems[0].contains("server.bind"));
        assert!(config.server.bind.is_none());
    }

    #[test]
    fn test_validate_zero_upload_limit() {
        let mut config = AppConfig::default();
        config.server.max_upload_mb = Some(0);

        assert!(config.validate()[0].contains("server.max_upload_mb"));
        assert!(config.server.max_upload_mb.is_none());
    }

    #[test]
    fn test_validate_output_format_invalid() {
        let mut config = AppConfig::default();
        config.output.format = Some("xml".to_string());

        let problems = config.validate();
        assert!(problems[0].contains("output.format"));
        assert!(config.output.format.is_none());
    }

    #[test]
    fn test_validate_reports_every_problem() {
        let mut config = AppConfig::default();
        config.detector.score_threshold = Some(-0.1);
        config.detector.nms_threshold = Some(2.0);
        config.output.format = Some("yaml".to_string());

        assert_eq!(config.validate().len(), 3);
    }

    #[test]
    fn test_validate_all_valid_passes() {
        let mut config: AppConfig = toml::from_str(
            r"
[server]
bind = '127.0.0.1:8501'
max_upload_mb = 32

[detector]
score_threshold = 0.75
nms_threshold = 0.3

[output]
format = 'jsonl'
",
        )
        .expect("parse valid config");

        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_find_config_in_parents() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join(PROJECT_CONFIG_FILE), "").unwrap();

        let found = find_config_in_parents(&nested);
        assert_eq!(found, Some(root.path().join(PROJECT_CONFIG_FILE)));
    }
}
