//! Cookie jar pulled from a remote paste URL
//!
//! The jar is a Netscape-format text file handed to yt-dlp via `--cookies`.
//! Each refresh replaces it wholesale.

use crate::utils::error::VidgateError;
use anyhow::Result;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

pub struct CookieStore {
    client: Client,
    url: Option<String>,
    path: PathBuf,
    // Serializes writers so two refreshes never interleave
    write_lock: Mutex<()>,
}

impl CookieStore {
    pub fn new(url: Option<String>, path: PathBuf) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, url, path)
    }

    pub fn with_client(client: Client, url: Option<String>, path: PathBuf) -> Self {
        Self {
            client,
            url,
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Download the jar and overwrite the local file
    ///
    /// Failures are logged and reported as `false`.
    pub async fn refresh(&self) -> bool {
        let Some(url) = self.url.as_deref() else {
            warn!("No cookies URL configured, skipping refresh");
            return false;
        };

        match self.fetch_and_store(url).await {
            Ok(bytes) => {
                info!(
                    "[+] Cloud cookies downloaded and saved to {} ({} bytes)",
                    self.path.display(),
                    bytes
                );
                true
            }
            Err(e) => {
                error!("[-] Failed to download cloud cookies: {}", e);
                false
            }
        }
    }

    async fn fetch_and_store(&self, url: &str) -> Result<usize> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(VidgateError::from)?
            .error_for_status()
            .map_err(VidgateError::from)?;
        let body = response.text().await.map_err(VidgateError::from)?;

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Write beside the target then rename so yt-dlp never reads a torn file
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body.as_bytes()).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(body.len())
    }

    /// Path to the jar, fetching it first if it is missing
    pub async fn ensure(&self) -> Option<PathBuf> {
        if !self.exists().await {
            warn!("Cookies file not found, attempting to download from cloud...");
            self.refresh().await;
        }

        if self.exists().await {
            Some(self.path.clone())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refresh_without_url_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = CookieStore::new(None, dir.path().join("cookies.txt"));

        assert!(!store.refresh().await);
        assert!(!store.exists().await);
        assert!(store.ensure().await.is_none());
    }

    #[tokio::test]
    async fn test_ensure_returns_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.txt");
        std::fs::write(&path, "# Netscape HTTP Cookie File\n").unwrap();

        let store = CookieStore::new(None, path.clone());
        assert_eq!(store.ensure().await, Some(path));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_old_jar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.txt");
        std::fs::write(&path, "old").unwrap();

        // Nothing listens on port 9 locally
        let store = CookieStore::new(Some("http://127.0.0.1:9/raw".to_string()), path.clone());
        assert!(!store.refresh().await);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");
    }
}
