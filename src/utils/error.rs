//! Error handling for vidgate

use thiserror::Error;

/// Main error type for vidgate
#[derive(Debug, Error)]
pub enum VidgateError {
    #[error("yt-dlp not found. Please install yt-dlp")]
    YtDlpNotFound,

    #[error("Failed to extract video info: {0}")]
    ExtractionError(String),

    #[error("Download failed: {0}")]
    DownloadError(String),

    #[error("yt-dlp timed out after {0}s")]
    Timeout(u64),

    #[error("yt-dlp finished but no downloaded file was found")]
    OutputMissing,

    #[error("Unsupported platform. Only YouTube, Instagram and Facebook URLs are supported.")]
    UnsupportedPlatform,

    #[error("Unsupported quality. Use: {0}")]
    UnsupportedQuality(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl VidgateError {
    /// Whether the error was caused by the request rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            VidgateError::UnsupportedPlatform
                | VidgateError::UnsupportedQuality(_)
                | VidgateError::InvalidUrl(_)
        )
    }
}
