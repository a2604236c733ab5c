//! API handlers for downloads, metadata and cookie management

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::extractor::{
    effective_quality, format_selector, DownloadRequest, Platform, Quality, SUPPORTED_QUALITIES,
};
use crate::server::error::ApiError;
use crate::server::job::{JobDir, JobFileStream};
use crate::server::AppState;
use crate::utils::filename::{content_disposition, content_type_for_path, download_filename};

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub url: Option<String>,
    pub quality: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UrlQuery {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckCookiesQuery {
    pub refresh: Option<String>,
}

fn required_url(raw: Option<String>, message: &str) -> Result<String, ApiError> {
    raw.map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request(message))
}

/// GET /api/video/download?url=URL&quality=720
pub async fn download_video(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let url = required_url(query.url, "Video URL parameter is required")?;
    let platform = Platform::detect(&url);

    let requested = if platform.supports_quality() {
        Quality::parse(query.quality.as_deref()).map_err(|_| {
            ApiError::bad_request(format!(
                "Unsupported quality for {}. Use: {}",
                platform,
                SUPPORTED_QUALITIES.join(", ")
            ))
        })?
    } else {
        if platform == Platform::Instagram && query.quality.is_some() {
            info!("Quality parameter ignored for Instagram");
        }
        Quality::Best
    };
    let quality = effective_quality(platform, requested);
    let format = format_selector(platform, &quality)?;

    let cookies = state.cookies.ensure().await;
    match &cookies {
        Some(path) => info!("Using cloud cookies from: {}", path.display()),
        None => warn!("No cookies file available, proceeding without cookies"),
    }

    let job = JobDir::create(&state.transfer_dir)
        .await
        .map_err(|e| ApiError::from_anyhow("Error downloading video", &e))?;
    let request = DownloadRequest {
        url: url.clone(),
        format,
        output_dir: job.path().to_path_buf(),
        cookies,
    };

    let downloaded = {
        let _permit = state
            .download_slots
            .acquire()
            .await
            .map_err(|_| ApiError::internal("Download queue is closed"))?;
        state
            .extractor
            .download(&request)
            .await
            .map_err(|e| ApiError::from_anyhow("Error downloading video", &e))?
    };
    info!(
        "Successfully downloaded from {}: {} in {}",
        platform,
        downloaded.title,
        quality
    );

    let file = tokio::fs::File::open(&downloaded.path)
        .await
        .map_err(|e| ApiError::internal(format!("Error downloading video: {}", e)))?;
    let size = file
        .metadata()
        .await
        .map_err(|e| ApiError::internal(format!("Error downloading video: {}", e)))?
        .len();

    let ext = downloaded
        .path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("mp4");
    let filename = download_filename(&downloaded.title, platform, &quality, ext);

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(content_type_for_path(&downloaded.path)),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(size));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&content_disposition(&filename))
            .map_err(|_| ApiError::internal("Could not build download header"))?,
    );

    let body = Body::from_stream(JobFileStream::new(file, job));
    Ok((headers, body).into_response())
}

/// GET /api/video/info?url=URL
pub async fn video_info(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<Value>, ApiError> {
    let url = required_url(query.url, "Video URL is required")?;
    let platform = Platform::detect(&url);
    let cookies = state.cookies.ensure().await;

    let info = state
        .extractor
        .extract_info(&url, cookies.as_deref())
        .await
        .map_err(|e| ApiError::from_anyhow("", &e))?;

    let mut body = json!({
        "platform": platform,
        "title": info.title,
        "duration": info.duration,
        "uploader": info.uploader,
        "view_count": info.view_count,
        "thumbnail": info.thumbnail,
        "cookies_used": cookies.is_some(),
        "url": url,
    });
    if platform.supports_quality() {
        body["supported_qualities"] = json!(SUPPORTED_QUALITIES);
    } else {
        body["message"] = json!("Instagram videos download in best available quality");
    }

    Ok(Json(body))
}

/// GET /api/video/formats?url=URL
pub async fn video_formats(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> Result<Json<Value>, ApiError> {
    let url = required_url(query.url, "Video URL is required")?;
    let platform = Platform::detect(&url);

    if !platform.supports_quality() {
        return Ok(Json(json!({
            "platform": platform,
            "message": "Formats endpoint only available for YouTube and Facebook videos",
            "supported_qualities": ["best"],
        })));
    }

    let cookies = state.cookies.ensure().await;
    let info = state
        .extractor
        .extract_info(&url, cookies.as_deref())
        .await
        .map_err(|e| ApiError::from_anyhow("", &e))?;

    Ok(Json(json!({
        "platform": platform,
        "title": info.title,
        "duration": info.duration,
        "available_qualities": info.available_qualities(),
        "cookies_used": cookies.is_some(),
        "formats_count": info.video_formats().count(),
    })))
}

/// GET /api/check-cookies?refresh=true
pub async fn check_cookies(
    State(state): State<AppState>,
    Query(query): Query<CheckCookiesQuery>,
) -> Json<Value> {
    let refresh = query
        .refresh
        .as_deref()
        .is_some_and(|v| v.eq_ignore_ascii_case("true"));

    let success = if refresh {
        state.cookies.refresh().await
    } else {
        state.cookies.exists().await
    };
    let cookies_file = state.cookies.ensure().await;

    Json(json!({
        "cookies_available": cookies_file.is_some(),
        "cookies_file": cookies_file,
        "cloud_url": state.cookies.url(),
        "refreshed": refresh,
        "success": success,
    }))
}

/// POST /api/refresh-cookies
pub async fn refresh_cookies(State(state): State<AppState>) -> Json<Value> {
    let success = state.cookies.refresh().await;
    let cookies_file = state.cookies.ensure().await;

    Json(json!({
        "success": success,
        "cookies_file": cookies_file,
        "message": if success {
            "Cookies refreshed successfully"
        } else {
            "Failed to refresh cookies"
        },
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "extractor": state.extractor.id(),
    }))
}

/// GET / usage page
pub async fn home(State(state): State<AppState>) -> Html<String> {
    let cookies = state.cookies.url().unwrap_or("disabled");
    let qualities = SUPPORTED_QUALITIES.join(", ");
    Html(format!(
        r#"<h1>Video Download API</h1>
<p>Supports YouTube, Instagram and Facebook videos</p>
<p><strong>Using Cloud Cookies:</strong> {cookies}</p>

<h2>Available endpoints:</h2>
<ul>
    <li><strong>Direct Download:</strong> GET /api/video/download?url=URL&amp;quality=720</li>
    <li><strong>Video Info:</strong> GET /api/video/info?url=URL</li>
    <li><strong>YouTube/Facebook Formats:</strong> GET /api/video/formats?url=URL</li>
    <li><strong>Check Cookies:</strong> GET /api/check-cookies</li>
    <li><strong>Refresh Cookies:</strong> POST /api/refresh-cookies</li>
</ul>

<h2>Supported Platforms:</h2>
<ul>
    <li><strong>YouTube:</strong> Quality options: {qualities}</li>
    <li><strong>Facebook:</strong> Quality options: {qualities}</li>
    <li><strong>Instagram:</strong> Always downloads best available quality (quality parameter ignored)</li>
</ul>
"#
    ))
}

