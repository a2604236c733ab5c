//! Integration-style tests driving the HTTP API with a stand-in extractor, without hitting the network.

use anyhow::Result;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;
use vidgate::extractor::{DownloadRequest, DownloadedFile, Extractor, Format, VideoInfo};
use vidgate::{router, AppState, CookieStore, VidgateError};

#[derive(Default)]
struct FakeExtractor {
    fail: bool,
    requests: Mutex<Vec<DownloadRequest>>,
    info_calls: Mutex<usize>,
}

#[async_trait]
impl Extractor for FakeExtractor {
    fn id(&self) -> &'static str {
        "fake"
    }

    async fn extract_info(&self, url: &str, _cookies: Option<&Path>) -> Result<VideoInfo> {
        *self.info_calls.lock().unwrap() += 1;
        if self.fail {
            return Err(VidgateError::ExtractionError("ERROR: Video unavailable".into()).into());
        }
        Ok(sample_video(url))
    }

    async fn download(&self, request: &DownloadRequest) -> Result<DownloadedFile> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(VidgateError::DownloadError("ERROR: Video unavailable".into()).into());
        }
        let path = request.output_dir.join("My Clip!.mp4");
        tokio::fs::write(&path, b"fake video bytes").await?;
        Ok(DownloadedFile {
            path,
            title: "My Clip!".to_string(),
        })
    }
}

fn video_format(id: &str, height: Option<u32>, vcodec: &str) -> Format {
    Format {
        format_id: id.to_string(),
        ext: "mp4".to_string(),
        vcodec: Some(vcodec.to_string()),
        height,
        ..Default::default()
    }
}

fn sample_video(url: &str) -> VideoInfo {
    VideoInfo {
        id: "vid123".to_string(),
        title: "Sample Video".to_string(),
        webpage_url: Some(url.to_string()),
        duration: Some(60.0),
        thumbnail: Some("https://example.com/thumb.jpg".to_string()),
        uploader: Some("Uploader".to_string()),
        view_count: Some(1_000),
        formats: vec![
            video_format("137", Some(1080), "avc1"),
            video_format("18", Some(360), "avc1"),
            video_format("22", Some(720), "avc1"),
            video_format("136", Some(720), "avc1"),
            video_format("140", None, "none"),
        ],
        extractor: Some("youtube".to_string()),
    }
}

struct Harness {
    _temp: TempDir,
    transfer_dir: PathBuf,
    extractor: Arc<FakeExtractor>,
    app: Router,
}

fn harness(extractor: FakeExtractor) -> Harness {
    let temp = TempDir::new().expect("temp dir");
    let transfer_dir = temp.path().join("jobs");
    std::fs::create_dir_all(&transfer_dir).unwrap();

    let extractor = Arc::new(extractor);
    let cookies = Arc::new(CookieStore::new(None, temp.path().join("cookies.txt")));
    let state = AppState::new(extractor.clone(), cookies, transfer_dir.clone(), 2);

    Harness {
        _temp: temp,
        transfer_dir,
        extractor,
        app: router(state),
    }
}

async fn get(app: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, _, body) = get(app, uri).await;
    (status, serde_json::from_slice(&body).expect("json body"))
}

/// Job directories are removed off-thread, so give the blocking pool a moment
async fn job_dirs_after_cleanup(dir: &Path) -> usize {
    let mut count = 0;
    for _ in 0..100 {
        count = std::fs::read_dir(dir).unwrap().count();
        if count == 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    count
}

#[tokio::test]
async fn download_requires_url() {
    let h = harness(FakeExtractor::default());

    let (status, body) = get_json(&h.app, "/api/video/download").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Video URL parameter is required");

    let (status, _) = get_json(&h.app, "/api/video/download?url=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn download_rejects_bad_quality_for_youtube() {
    let h = harness(FakeExtractor::default());

    let (status, body) = get_json(
        &h.app,
        "/api/video/download?url=https://youtu.be/abc&quality=999",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Unsupported quality for youtube"));
    assert!(message.contains("144, 240, 360, 480, 540, 720, 1080, 1440, 2160, best, worst"));
    assert!(h.extractor.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn download_rejects_unknown_platform() {
    let h = harness(FakeExtractor::default());

    let (status, body) = get_json(&h.app, "/api/video/download?url=https://vimeo.com/1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Unsupported platform"));
    assert!(h.extractor.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn download_streams_file_and_cleans_up() {
    let h = harness(FakeExtractor::default());

    let (status, headers, body) = get(
        &h.app,
        "/api/video/download?url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3Dabc&quality=720",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"fake video bytes");
    assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
    assert_eq!(headers[header::CONTENT_LENGTH], "16");
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment;"));
    assert!(disposition.contains("filename=\"My Clip_720p.mp4\""));

    let requests = h.extractor.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url, "https://www.youtube.com/watch?v=abc");
    assert_eq!(
        requests[0].format,
        "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/best[height<=720][ext=mp4]/best"
    );
    assert!(requests[0].cookies.is_none());
    assert!(requests[0].output_dir.starts_with(&h.transfer_dir));
    drop(requests);

    // Body fully consumed and dropped, so the job directory is gone
    assert_eq!(job_dirs_after_cleanup(&h.transfer_dir).await, 0);
}

#[tokio::test]
async fn instagram_ignores_quality() {
    let h = harness(FakeExtractor::default());

    let (status, headers, _) = get(
        &h.app,
        "/api/video/download?url=https://instagram.com/p/ABC123/&quality=9999",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.contains("My Clip_instagram.mp4"));
    assert_eq!(h.extractor.requests.lock().unwrap()[0].format, "best");
}

#[tokio::test]
async fn facebook_defaults_to_best() {
    let h = harness(FakeExtractor::default());

    let (status, headers, _) =
        get(&h.app, "/api/video/download?url=https://fb.watch/xyz/").await;

    assert_eq!(status, StatusCode::OK);
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.contains("My Clip_best.mp4"));
    assert_eq!(
        h.extractor.requests.lock().unwrap()[0].format,
        "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best"
    );
}

#[tokio::test]
async fn download_failure_returns_json_error() {
    let h = harness(FakeExtractor {
        fail: true,
        ..Default::default()
    });

    let (status, body) = get_json(&h.app, "/api/video/download?url=https://youtu.be/abc").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Error downloading video"));
    assert!(message.contains("Video unavailable"));
    assert_eq!(job_dirs_after_cleanup(&h.transfer_dir).await, 0);
}

#[tokio::test]
async fn formats_are_sorted_and_unique() {
    let h = harness(FakeExtractor::default());

    let (status, body) = get_json(&h.app, "/api/video/formats?url=https://youtu.be/abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["platform"], "youtube");
    assert_eq!(body["title"], "Sample Video");
    assert_eq!(
        body["available_qualities"],
        serde_json::json!(["360p", "720p", "1080p"])
    );
    assert_eq!(body["formats_count"], 4);
    assert_eq!(body["cookies_used"], false);
}

#[tokio::test]
async fn formats_for_instagram_skip_extraction() {
    let h = harness(FakeExtractor::default());

    let (status, body) =
        get_json(&h.app, "/api/video/formats?url=https://instagram.com/p/ABC/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["platform"], "instagram");
    assert_eq!(body["supported_qualities"], serde_json::json!(["best"]));
    assert_eq!(*h.extractor.info_calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn info_reports_metadata() {
    let h = harness(FakeExtractor::default());

    let (status, body) = get_json(&h.app, "/api/video/info?url=https://youtu.be/abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uploader"], "Uploader");
    assert_eq!(body["view_count"], 1000);
    assert_eq!(body["url"], "https://youtu.be/abc");
    assert_eq!(body["supported_qualities"].as_array().unwrap().len(), 11);
    assert!(body.get("message").is_none());

    let (_, body) = get_json(&h.app, "/api/video/info?url=https://instagram.com/p/ABC/").await;
    assert_eq!(
        body["message"],
        "Instagram videos download in best available quality"
    );
    assert!(body.get("supported_qualities").is_none());
}

#[tokio::test]
async fn info_failure_is_500() {
    let h = harness(FakeExtractor {
        fail: true,
        ..Default::default()
    });

    let (status, body) = get_json(&h.app, "/api/video/info?url=https://youtu.be/abc").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("Video unavailable"));

    let (status, body) = get_json(&h.app, "/api/video/info").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Video URL is required");
}

#[tokio::test]
async fn check_cookies_without_jar() {
    let h = harness(FakeExtractor::default());

    let (status, body) = get_json(&h.app, "/api/check-cookies?refresh=TRUE").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cookies_available"], false);
    assert_eq!(body["refreshed"], true);
    assert_eq!(body["success"], false);
    assert!(body["cloud_url"].is_null());
}

#[tokio::test]
async fn refresh_cookies_requires_post() {
    let h = harness(FakeExtractor::default());

    let (status, _, _) = get(&h.app, "/api/refresh-cookies").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let response = h
        .app
        .clone()
        .oneshot(
            Request::post("/api/refresh-cookies")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Failed to refresh cookies");
}

#[tokio::test]
async fn home_and_health() {
    let h = harness(FakeExtractor::default());

    let (status, _, body) = get(&h.app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("Video Download API"));

    let (status, body) = get_json(&h.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["extractor"], "fake");
}
