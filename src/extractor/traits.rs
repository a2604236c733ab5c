use crate::extractor::models::{DownloadRequest, DownloadedFile, VideoInfo};
use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

/// Core trait for video extractors
///
/// This isolates the HTTP layer from how media is actually fetched, so
/// handlers can run against a stand-in during tests.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns a unique identifier for this extractor (e.g. "ytdlp")
    fn id(&self) -> &'static str;

    /// Extracts video information without downloading
    async fn extract_info(&self, url: &str, cookies: Option<&Path>) -> Result<VideoInfo>;

    /// Downloads the video into `request.output_dir` and reports the file produced
    async fn download(&self, request: &DownloadRequest) -> Result<DownloadedFile>;
}
