//! HTTP server exposing the download API
//!
//! One request handler per endpoint. All media work is delegated to the
//! [`Extractor`] held in [`AppState`].

pub mod error;
pub mod handlers;
pub mod job;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::Semaphore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::cookies::{spawn_refresh_task, CookieStore};
use crate::extractor::{Extractor, YtDlpExtractor};
use crate::utils::config::AppSettings;

pub use error::ApiError;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<dyn Extractor>,
    pub cookies: Arc<CookieStore>,
    pub transfer_dir: PathBuf,
    pub download_slots: Arc<Semaphore>,
}

impl AppState {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        cookies: Arc<CookieStore>,
        transfer_dir: PathBuf,
        max_concurrent: usize,
    ) -> Self {
        Self {
            extractor,
            cookies,
            transfer_dir,
            download_slots: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route("/api/video/download", get(handlers::download_video))
        .route("/api/video/info", get(handlers::video_info))
        .route("/api/video/formats", get(handlers::video_formats))
        .route("/api/check-cookies", get(handlers::check_cookies))
        .route("/api/refresh-cookies", post(handlers::refresh_cookies))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the server until Ctrl-C
pub async fn run_server(settings: AppSettings) -> Result<()> {
    let extractor = YtDlpExtractor::new(settings.ytdlp_path.clone(), settings.ytdlp_timeout())?;
    if let Some(version) = extractor.version().await {
        info!("yt-dlp version: {}", version);
    }

    tokio::fs::create_dir_all(&settings.transfer_dir)
        .await
        .with_context(|| format!("creating {}", settings.transfer_dir.display()))?;
    if let Err(e) = job::cleanup_stale_jobs(&settings.transfer_dir).await {
        warn!("Could not clean stale jobs: {}", e);
    }

    let cookies = Arc::new(CookieStore::new(
        settings.cookies_url.clone(),
        settings.cookies_file.clone(),
    ));
    if settings.cookies_url.is_some() {
        cookies.refresh().await;
    }
    match cookies.ensure().await {
        Some(path) => info!("Cloud cookies loaded: {}", path.display()),
        None => warn!("No cookies file available. Age-restricted videos may not work."),
    }
    let refresher = match (settings.cookies_url.as_ref(), settings.cookies_refresh_interval()) {
        (Some(_), Some(period)) => Some(spawn_refresh_task(cookies.clone(), period)),
        _ => None,
    };

    let state = AppState::new(
        Arc::new(extractor),
        cookies,
        settings.transfer_dir.clone(),
        settings.max_concurrent,
    );
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("binding {}", settings.bind_addr))?;
    info!(
        "Video Download API listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = refresher {
        handle.abort();
    }
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
