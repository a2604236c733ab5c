//! Utility modules for error handling, configuration and file naming

pub mod config;
pub mod error;
pub mod filename;

// Re-export for convenience
pub use config::AppSettings;
pub use error::VidgateError;
pub use filename::{clean_title, content_disposition, content_type_for_path, download_filename};
