pub mod models;
pub mod platform;
pub mod traits;
pub mod ytdlp;

pub use models::{DownloadRequest, DownloadedFile, Format, VideoInfo};
pub use platform::{effective_quality, format_selector, Platform, Quality, SUPPORTED_QUALITIES};
pub use traits::Extractor;
pub use ytdlp::YtDlpExtractor;
