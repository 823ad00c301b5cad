//! Inline, user-visible messages.

use std::fmt;

/// How a notice should be styled on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Informational, not an error.
    Info,
    /// A recoverable per-item problem.
    Warning,
    /// A batch-level failure.
    Error,
}

impl Severity {
    /// Lowercase name, used as a CSS class and in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A message shown inline on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Styling.
    pub severity: Severity,
    /// Text shown to the user.
    pub message: String,
}

impl Notice {
    /// A file could not be decoded and was skipped.
    #[must_use]
    pub fn decode_failed(name: &str) -> Self {
        Self {
            severity: Severity::Warning,
            message: format!("Failed to decode the image: {name}"),
        }
    }

    /// Reading the batch failed; nothing from this interaction is processed.
    #[must_use]
    pub fn acquisition_failed(error: &anyhow::Error) -> Self {
        Self {
            severity: Severity::Error,
            message: format!("An error occurred: {error}"),
        }
    }

    /// No images to process.
    #[must_use]
    pub fn nothing_to_process() -> Self {
        Self {
            severity: Severity::Info,
            message: "Upload one or more images to see face detection in action!".to_string(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
