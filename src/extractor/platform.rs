//! Platform detection and yt-dlp format selection

use crate::utils::error::VidgateError;
use serde::Serialize;
use std::fmt;

/// Qualities accepted for YouTube and Facebook
pub const SUPPORTED_QUALITIES: &[&str] = &[
    "144", "240", "360", "480", "540", "720", "1080", "1440", "2160", "best", "worst",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(rename = "youtube")]
    YouTube,
    Instagram,
    Facebook,
    Unknown,
}

impl Platform {
    /// Substring match on the raw URL, the same way users paste them
    pub fn detect(url: &str) -> Self {
        if url.contains("youtube.com") || url.contains("youtu.be") {
            Platform::YouTube
        } else if url.contains("instagram.com") {
            Platform::Instagram
        } else if url.contains("facebook.com") || url.contains("fb.watch") {
            Platform::Facebook
        } else {
            Platform::Unknown
        }
    }

    /// Whether the `quality` parameter means anything on this platform
    pub fn supports_quality(&self) -> bool {
        matches!(self, Platform::YouTube | Platform::Facebook)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::YouTube => "youtube",
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Quality {
    Best,
    Worst,
    /// Maximum video height in pixels
    Height(u32),
}

impl Quality {
    /// Parse the `quality` query value; absent means best
    pub fn parse(raw: Option<&str>) -> Result<Self, VidgateError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(Quality::Best),
            Some(raw) => raw,
        };
        if !SUPPORTED_QUALITIES.contains(&raw) {
            return Err(VidgateError::UnsupportedQuality(SUPPORTED_QUALITIES.join(", ")));
        }
        Ok(match raw {
            "best" => Quality::Best,
            "worst" => Quality::Worst,
            height => height
                .parse()
                .map(Quality::Height)
                .map_err(|_| VidgateError::UnsupportedQuality(SUPPORTED_QUALITIES.join(", ")))?,
        })
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Best => f.write_str("best"),
            Quality::Worst => f.write_str("worst"),
            Quality::Height(h) => write!(f, "{}", h),
        }
    }
}

/// Build the `-f` selector handed to yt-dlp
///
/// Instagram always gets `best`; callers should report the effective quality
/// via [`effective_quality`].
pub fn format_selector(platform: Platform, quality: &Quality) -> Result<String, VidgateError> {
    match platform {
        Platform::YouTube | Platform::Facebook => Ok(match quality {
            Quality::Best => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string(),
            Quality::Worst => {
                "worstvideo[ext=mp4]+worstaudio[ext=m4a]/worst[ext=mp4]/worst".to_string()
            }
            Quality::Height(h) => format!(
                "bestvideo[height<={h}][ext=mp4]+bestaudio[ext=m4a]/best[height<={h}][ext=mp4]/best"
            ),
        }),
        Platform::Instagram => Ok("best".to_string()),
        Platform::Unknown => Err(VidgateError::UnsupportedPlatform),
    }
}

pub fn effective_quality(platform: Platform, requested: Quality) -> Quality {
    if platform.supports_quality() {
        requested
    } else {
        Quality::Best
    }
}
