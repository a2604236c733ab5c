//! vidgate - HTTP front end for yt-dlp
//!
//! Accepts a video URL, lets yt-dlp fetch it and streams the resulting file
//! back to the caller.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vidgate::utils::AppSettings;

#[derive(Parser)]
#[command(version, about = "HTTP video download API backed by yt-dlp")]
struct Args {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long)]
    bind: Option<String>,

    /// Path to the yt-dlp binary
    #[arg(long)]
    ytdlp: Option<PathBuf>,

    /// Remote cookie jar URL
    #[arg(long)]
    cookies_url: Option<String>,

    /// Local cookie jar path
    #[arg(long)]
    cookies_file: Option<PathBuf>,

    /// Disable fetching cookies from the remote URL
    #[arg(long)]
    no_cloud_cookies: bool,

    /// Maximum concurrent downloads
    #[arg(long)]
    max_concurrent: Option<usize>,
}

impl Args {
    fn into_settings(self) -> Result<AppSettings> {
        let mut settings = match &self.config {
            Some(path) => AppSettings::from_file(path)?,
            None => AppSettings::default(),
        };
        settings.apply_env();

        if let Some(bind) = self.bind {
            settings.bind_addr = bind;
        }
        if let Some(path) = self.ytdlp {
            settings.ytdlp_path = Some(path);
        }
        if let Some(url) = self.cookies_url {
            settings.cookies_url = Some(url);
        }
        if let Some(path) = self.cookies_file {
            settings.cookies_file = path;
        }
        if self.no_cloud_cookies {
            settings.cookies_url = None;
        }
        if let Some(n) = self.max_concurrent {
            settings.max_concurrent = n;
        }

        settings.validate();
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Args::parse().into_settings()?;
    tracing::debug!("Settings: {:?}", settings);

    vidgate::run_server(settings).await
}
