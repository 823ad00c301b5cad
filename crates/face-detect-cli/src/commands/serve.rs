//! Serve command - the browser demo.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use clap::Args;
use face_detect_adapters::{
    render_error_page, render_page, MemoryUploadSource, PageOptions, TracingProgress,
};
use face_detect_core::{FaceDetectionApp, Page, UploadedBlob};
use tracing::{debug, error, info};

use super::DetectorArgs;
use crate::config::AppConfig;

/// Multipart field carrying the uploaded files.
const FILES_FIELD: &str = "files";

mod defaults {
    pub const BIND: &str = "127.0.0.1:8501";
    pub const MAX_UPLOAD_MB: u64 = 32;
}

/// Arguments for the serve command.
#[derive(Args, Clone, Default)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Largest accepted request body, in MiB
    #[arg(long, value_name = "MB", value_parser = clap::value_parser!(u64).range(1..))]
    pub max_upload_mb: Option<u64>,

    #[command(flatten)]
    pub detector: DetectorArgs,
}

impl ServeArgs {
    /// Apply configuration file values, respecting CLI precedence.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        if self.bind.is_none() {
            self.bind = config.server.bind.as_ref().and_then(|b| b.parse().ok());
        }
        self.max_upload_mb = self.max_upload_mb.or(config.server.max_upload_mb);
        self.detector.apply_config(config);
        self
    }

    fn bind(&self) -> SocketAddr {
        self.bind.unwrap_or_else(|| {
            defaults::BIND
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8501)))
        })
    }

    fn max_upload_bytes(&self) -> usize {
        let mb = self.max_upload_mb.unwrap_or(defaults::MAX_UPLOAD_MB);
        usize::try_from(mb.saturating_mul(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The pipeline, holding the one detector for this process.
    pub app: FaceDetectionApp,
    /// Request body limit in bytes.
    pub max_upload: usize,
}

/// Run the serve command.
///
/// Loads the detector before binding, so a missing model fails at startup.
pub fn run(args: &ServeArgs) -> Result<()> {
    let detector = args.detector.settings().load()?;
    let state = AppState {
        app: FaceDetectionApp::new(Arc::new(detector)),
        max_upload: args.max_upload_bytes(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(serve(args.bind(), state))
}

async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local = listener.local_addr()?;
    info!("Listening on {local}");
    eprintln!("Face detection demo running at http://{local}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

/// Routes: `GET /`, `POST /`, `GET /health`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(upload))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(state.max_upload))
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn index(State(state): State<AppState>) -> Response {
    // No uploads: the pipeline goes straight to Idle without touching the detector.
    match state
        .app
        .run(&MemoryUploadSource::default(), &TracingProgress)
    {
        Ok(page) => render(&page),
        Err(e) => failure(&e),
    }
}

async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let source = read_uploads(&mut multipart).await;
    debug!("Received {} file(s)", source.len());

    let app = state.app.clone();
    let result = tokio::task::spawn_blocking(move || app.run(&source, &TracingProgress)).await;

    match result {
        Ok(Ok(page)) => render(&page),
        Ok(Err(e)) => failure(&e),
        Err(e) => failure(&anyhow::anyhow!("Worker task failed: {e}")),
    }
}

#[allow(clippy::unused_async)]
async fn health() -> &'static str {
    "ok"
}

/// Drains the `files` fields; a read error keeps what arrived and marks the
/// source as failed. Parts without a file name are named `upload-N` by
/// position.
async fn read_uploads(multipart: &mut Multipart) -> MemoryUploadSource {
    let mut blobs = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return MemoryUploadSource::new(blobs).with_failure(e.body_text()),
        };

        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();

        match field.bytes().await {
            // Browsers send one empty part when no file was chosen.
            Ok(bytes) if name.is_empty() && bytes.is_empty() => {}
            Ok(bytes) => {
                let name = if name.is_empty() {
                    format!("upload-{}", blobs.len() + 1)
                } else {
                    name
                };
                blobs.push(UploadedBlob::new(name, bytes.to_vec()));
            }
            Err(e) => return MemoryUploadSource::new(blobs).with_failure(e.body_text()),
        }
    }

    MemoryUploadSource::new(blobs)
}

fn render(page: &Page) -> Response {
    match render_page(page, PageOptions::default()) {
        Ok(html) => Html(html).into_response(),
        Err(e) => failure(&e),
    }
}

fn failure(e: &anyhow::Error) -> Response {
    error!("{e:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(render_error_page(e)),
    )
        .into_response()
}
