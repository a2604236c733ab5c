//! Application configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Paste URL the cookie jar is pulled from when nothing else is configured
pub const DEFAULT_COOKIES_URL: &str = "https://batbin.me/raw/winnock";

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Address the HTTP server listens on
    pub bind_addr: String,

    /// Explicit yt-dlp binary, skips discovery when set
    pub ytdlp_path: Option<PathBuf>,

    /// Remote location of the Netscape cookie file (empty disables refresh)
    pub cookies_url: Option<String>,

    /// Local cookie jar handed to yt-dlp
    pub cookies_file: PathBuf,

    /// Seconds between background cookie refreshes, 0 disables
    pub cookies_refresh_interval_secs: u64,

    /// Parent directory for per-request job directories
    pub transfer_dir: PathBuf,

    /// Maximum concurrent downloads
    pub max_concurrent: usize,

    /// Upper bound for a single yt-dlp invocation
    pub ytdlp_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            ytdlp_path: None,
            cookies_url: Some(DEFAULT_COOKIES_URL.to_string()),
            cookies_file: PathBuf::from("cookies.txt"),
            cookies_refresh_interval_secs: 6 * 60 * 60,
            transfer_dir: default_transfer_dir(),
            max_concurrent: 3,
            ytdlp_timeout_secs: 600,
        }
    }
}

/// Returns the default job directory
/// - Linux: ~/.cache/vidgate/jobs
/// - macOS: ~/Library/Caches/vidgate/jobs
/// - Falls back to the system temp dir
pub fn default_transfer_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("vidgate")
        .join("jobs")
}

impl AppSettings {
    /// Load settings from a JSON file, missing keys fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let settings: AppSettings = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(settings)
    }

    /// Overlay `VIDGATE_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay variables from an arbitrary lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("VIDGATE_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = lookup("VIDGATE_YTDLP_PATH") {
            self.ytdlp_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("VIDGATE_COOKIES_URL") {
            self.cookies_url = Some(v);
        }
        if let Some(v) = lookup("VIDGATE_COOKIES_FILE") {
            self.cookies_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("VIDGATE_TRANSFER_DIR") {
            self.transfer_dir = PathBuf::from(v);
        }
        parse_into(
            &lookup,
            "VIDGATE_COOKIES_REFRESH_INTERVAL_SECS",
            &mut self.cookies_refresh_interval_secs,
        );
        parse_into(&lookup, "VIDGATE_MAX_CONCURRENT", &mut self.max_concurrent);
        parse_into(&lookup, "VIDGATE_YTDLP_TIMEOUT_SECS", &mut self.ytdlp_timeout_secs);
    }

    /// Enforce sane minimums and normalize empty values
    pub fn validate(&mut self) {
        if self.max_concurrent == 0 {
            self.max_concurrent = 1;
        }
        if self.ytdlp_timeout_secs == 0 {
            self.ytdlp_timeout_secs = 1;
        }
        if matches!(self.cookies_url.as_deref(), Some(url) if url.trim().is_empty()) {
            self.cookies_url = None;
        }
    }

    pub fn ytdlp_timeout(&self) -> Duration {
        Duration::from_secs(self.ytdlp_timeout_secs)
    }

    /// `None` when periodic refresh is disabled
    pub fn cookies_refresh_interval(&self) -> Option<Duration> {
        (self.cookies_refresh_interval_secs > 0)
            .then(|| Duration::from_secs(self.cookies_refresh_interval_secs))
    }
}

fn parse_into<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse::<T>() {
            Ok(v) => *slot = v,
            Err(_) => warn!("Ignoring invalid value for {}: {:?}", key, raw),
        }
    }
}
