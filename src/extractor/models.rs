//! Data structures for yt-dlp metadata and download jobs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Subset of `yt-dlp --dump-json` output
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub uploader: Option<String>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub formats: Vec<Format>,
    pub extractor: Option<String>,
}

/// Video format information
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Format {
    #[serde(default)]
    pub format_id: String,
    #[serde(default)]
    pub ext: String,
    #[serde(default)]
    pub filesize: Option<u64>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub format_note: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Format {
    /// Audio-only formats report `vcodec: "none"`
    pub fn has_video(&self) -> bool {
        self.vcodec.as_deref() != Some("none")
    }
}

impl VideoInfo {
    /// Formats carrying a video stream
    pub fn video_formats(&self) -> impl Iterator<Item = &Format> {
        self.formats.iter().filter(|f| f.has_video())
    }

    /// Unique `"{height}p"` labels of video formats, ascending
    pub fn available_qualities(&self) -> Vec<String> {
        let mut heights: Vec<u32> = self.video_formats().filter_map(|f| f.height).collect();
        heights.sort_unstable();
        heights.dedup();
        heights.into_iter().map(|h| format!("{}p", h)).collect()
    }
}

/// Everything yt-dlp needs to fetch one video into a job directory
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub format: String,
    pub output_dir: PathBuf,
    pub cookies: Option<PathBuf>,
}

/// A file yt-dlp produced for a [`DownloadRequest`]
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub title: String,
}
