//! Filename and header helpers for served downloads

use crate::extractor::{Platform, Quality};
use std::path::Path;

/// Keep alphanumerics, spaces, `-` and `_`, then trim trailing whitespace
pub fn clean_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_end();
    if cleaned.is_empty() {
        "video".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Name offered to the client for a finished download
///
/// `ext` is the extension of the file yt-dlp actually produced.
pub fn download_filename(title: &str, platform: Platform, quality: &Quality, ext: &str) -> String {
    let base = clean_title(title);
    let suffix = match platform {
        Platform::Instagram => "instagram".to_string(),
        _ => match quality {
            Quality::Height(h) => format!("{}p", h),
            other => other.to_string(),
        },
    };
    let ext = if ext.is_empty() { "mp4" } else { ext };
    format!("{}_{}.{}", base, suffix, ext)
}

pub fn content_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        "mov" => "video/quicktime",
        "m4a" => "audio/mp4",
        "mp3" => "audio/mpeg",
        "opus" | "ogg" => "audio/ogg",
        _ => "application/octet-stream",
    }
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name
pub fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(filename)
    )
}
