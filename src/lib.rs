//! vidgate library

pub mod cookies;
pub mod extractor;
pub mod server;
pub mod utils;

// Re-export main types for easier use
pub use cookies::CookieStore;
pub use extractor::{Extractor, Platform, Quality, VideoInfo, YtDlpExtractor};
pub use server::{router, run_server, AppState};
pub use utils::{AppSettings, VidgateError};
