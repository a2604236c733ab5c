//! yt-dlp wrapper for video extraction and download
//!
//! Every call shells out to the yt-dlp binary. Invocations are bounded by a
//! timeout and the child is killed if it overruns.

use crate::extractor::models::{DownloadRequest, DownloadedFile, VideoInfo};
use crate::extractor::traits::Extractor;
use crate::utils::error::VidgateError;
use anyhow::Result;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command as AsyncCommand;
use tracing::{debug, error, info, warn};

/// Output template inside the job directory
const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Main video extractor using yt-dlp
pub struct YtDlpExtractor {
    ytdlp_path: PathBuf,
    timeout: Duration,
}

impl YtDlpExtractor {
    /// Initialize extractor and verify yt-dlp availability
    ///
    /// An explicit path wins; otherwise see [`find_ytdlp`].
    pub fn new(explicit: Option<PathBuf>, timeout: Duration) -> Result<Self> {
        let ytdlp_path = match explicit.or_else(find_ytdlp) {
            Some(path) => {
                info!("Found yt-dlp at: {}", path.display());
                path
            }
            None => {
                error!("yt-dlp not found anywhere!");
                return Err(VidgateError::YtDlpNotFound.into());
            }
        };

        Ok(Self {
            ytdlp_path,
            timeout,
        })
    }

    /// Get the path to yt-dlp being used
    pub fn ytdlp_path(&self) -> &Path {
        &self.ytdlp_path
    }

    /// Report `yt-dlp --version`, `None` if the binary does not run
    pub async fn version(&self) -> Option<String> {
        let output = self.run(vec!["--version".to_string()]).await.ok()?;
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn run(&self, args: Vec<String>) -> Result<Output, VidgateError> {
        debug!("Running {} {:?}", self.ytdlp_path.display(), args);

        let mut command = AsyncCommand::new(&self.ytdlp_path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own group so ffmpeg children can be killed along with yt-dlp
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                VidgateError::YtDlpNotFound
            } else {
                VidgateError::from(e)
            }
        })?;
        let pid = child.id();

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(output) => Ok(output?),
            Err(_) => {
                error!("yt-dlp timed out after {}s", self.timeout.as_secs());
                kill_process_group(pid);
                Err(VidgateError::Timeout(self.timeout.as_secs()))
            }
        }
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else {
        return;
    };
    // The child leads its own group, so its pid is the group id
    let rc = unsafe { libc::killpg(pid as libc::pid_t, libc::SIGKILL) };
    if rc != 0 {
        debug!("killpg({}) failed: {}", pid, std::io::Error::last_os_error());
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn id(&self) -> &'static str {
        "ytdlp"
    }

    /// Uses: yt-dlp --dump-json --no-download
    async fn extract_info(&self, url: &str, cookies: Option<&Path>) -> Result<VideoInfo> {
        debug!("Extracting video info for URL: {}", url);

        let output = self.run(build_info_args(url, cookies)).await?;
        if !output.status.success() {
            let error_msg = last_stderr_line(&output.stderr);
            error!("yt-dlp extraction failed: {}", error_msg);
            return Err(VidgateError::ExtractionError(error_msg).into());
        }

        let json_str = String::from_utf8(output.stdout)?;
        let video_info: VideoInfo = serde_json::from_str(&json_str)?;

        Ok(video_info)
    }

    async fn download(&self, request: &DownloadRequest) -> Result<DownloadedFile> {
        debug!(
            "Downloading {} with format {:?} into {}",
            request.url,
            request.format,
            request.output_dir.display()
        );

        let output = self.run(build_download_args(request)).await?;
        if !output.status.success() {
            let error_msg = last_stderr_line(&output.stderr);
            error!("yt-dlp download failed: {}", error_msg);
            return Err(VidgateError::DownloadError(error_msg).into());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (printed_title, printed_path) = parse_printed(&stdout);
        let path = resolve_downloaded_file(&request.output_dir, printed_path).await?;

        let title = printed_title
            .map(ToString::to_string)
            .or_else(|| {
                path.file_stem()
                    .and_then(|s| s.to_str())
                    .map(ToString::to_string)
            })
            .unwrap_or_else(|| "video".to_string());

        Ok(DownloadedFile { path, title })
    }
}

/// Arguments for a metadata-only run
pub fn build_info_args(url: &str, cookies: Option<&Path>) -> Vec<String> {
    let mut args = vec![
        "--dump-json".to_string(),
        "--no-download".to_string(),
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
    ];
    push_cookies(&mut args, cookies);
    args.push("--".to_string());
    args.push(url.to_string());
    args
}

/// Arguments for a download run
///
/// The title and final path are printed after post-processing so the caller
/// does not have to guess what the merger produced.
pub fn build_download_args(request: &DownloadRequest) -> Vec<String> {
    let template = request.output_dir.join(OUTPUT_TEMPLATE);
    let mut args = vec![
        "--no-playlist".to_string(),
        "--no-warnings".to_string(),
        "--no-simulate".to_string(),
        "--print".to_string(),
        "after_move:title".to_string(),
        "--print".to_string(),
        "after_move:filepath".to_string(),
        "-f".to_string(),
        request.format.clone(),
        "-o".to_string(),
        template.to_string_lossy().into_owned(),
    ];
    push_cookies(&mut args, request.cookies.as_deref());
    args.push("--".to_string());
    args.push(request.url.clone());
    args
}

fn push_cookies(args: &mut Vec<String>, cookies: Option<&Path>) {
    if let Some(path) = cookies {
        args.push("--cookies".to_string());
        args.push(path.to_string_lossy().into_owned());
    }
}

/// Last non-empty stderr line, which is where yt-dlp puts `ERROR: ...`
pub fn last_stderr_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .next_back()
        .unwrap_or("yt-dlp exited without an error message")
        .to_string()
}

/// Split `--print` output into (title, filepath)
fn parse_printed(stdout: &str) -> (Option<&str>, Option<&str>) {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty()).rev();
    let path = lines.next();
    let title = lines.next();
    (title, path)
}

/// Locate the produced file inside `job_dir`
///
/// Prefers the path yt-dlp printed, then falls back to the first regular file
/// in the directory. Anything resolving outside `job_dir` is ignored.
pub async fn resolve_downloaded_file(job_dir: &Path, printed: Option<&str>) -> Result<PathBuf> {
    let canonical_dir = tokio::fs::canonicalize(job_dir).await?;

    if let Some(printed) = printed {
        let candidate = PathBuf::from(printed);
        let candidate = if candidate.is_absolute() {
            candidate
        } else {
            job_dir.join(candidate)
        };
        if let Some(found) = check_candidate(&canonical_dir, &candidate).await? {
            return Ok(found);
        }
        warn!("Printed path {:?} not usable, scanning job directory", printed);
    }

    let mut entries = tokio::fs::read_dir(job_dir).await?;
    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_partial(&path) {
            continue;
        }
        if let Some(valid) = check_candidate(&canonical_dir, &path).await? {
            found.push(valid);
        }
    }
    found.sort();

    found
        .into_iter()
        .next()
        .ok_or_else(|| VidgateError::OutputMissing.into())
}

async fn check_candidate(canonical_dir: &Path, candidate: &Path) -> Result<Option<PathBuf>> {
    let metadata = match tokio::fs::metadata(candidate).await {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_file() {
        return Ok(None);
    }

    let canonical = tokio::fs::canonicalize(candidate).await?;
    if !canonical.starts_with(canonical_dir) {
        warn!("Rejected file outside job directory: {:?}", canonical);
        return Ok(None);
    }
    Ok(Some(canonical))
}

/// Leftovers from an interrupted fragment download
fn is_partial(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("part" | "ytdl" | "temp")
    )
}

// ============================================================
// yt-dlp Detection Functions
// ============================================================

/// Find yt-dlp binary with priority:
/// 1. Next to the executable
/// 2. System PATH
/// 3. Common installation paths
pub fn find_ytdlp() -> Option<PathBuf> {
    if let Some(bundled) = find_bundled_ytdlp() {
        info!("✓ Using bundled yt-dlp: {:?}", bundled);
        return Some(bundled);
    }

    if let Ok(system) = which::which("yt-dlp") {
        info!("✓ Using system yt-dlp: {:?}", system);
        return Some(system);
    }

    if let Some(common) = find_in_common_paths() {
        info!("✓ Using yt-dlp from common path: {:?}", common);
        return Some(common);
    }

    warn!("✗ yt-dlp not found anywhere!");
    None
}

fn find_bundled_ytdlp() -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let exe_dir = exe_path.parent()?;

    let binary_name = if cfg!(target_os = "windows") {
        "yt-dlp.exe"
    } else {
        "yt-dlp"
    };
    let adjacent = exe_dir.join(binary_name);
    if adjacent.is_file() && is_executable(&adjacent) {
        return Some(adjacent);
    }

    None
}

fn find_in_common_paths() -> Option<PathBuf> {
    let mut candidates = vec![
        PathBuf::from("/usr/local/bin/yt-dlp"),
        PathBuf::from("/usr/bin/yt-dlp"),
        PathBuf::from("/opt/homebrew/bin/yt-dlp"),
    ];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local").join("bin").join("yt-dlp"));
    }

    candidates
        .into_iter()
        .find(|path| path.is_file() && is_executable(path))
}

/// Check if a file is executable
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        path.exists()
    }
}

// ============================================================
// Tests
// ============================================================
