//! Face Detect Adapters - External adapters for face-detect.
//!
//! This crate provides adapters for:
//! - Filesystem and in-memory upload sources
//! - HTML page rendering
//! - Tracing-backed progress reporting
//! - Model downloading and caching

pub mod fs;
pub mod html;
pub mod log;
pub mod memory;
pub mod models;

pub use fs::FsUploadSource;
pub use html::{render_error_page, render_page, PageOptions, PAGE_TITLE};
pub use log::TracingProgress;
pub use memory::MemoryUploadSource;
pub use models::{model_path, models_dir};
