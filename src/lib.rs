//! Downloads a versioned runtime bundle from a content cache and mirrors it into a
//! local directory.

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod source;

pub use api::download::{download_runtime, DownloadRequest, DownloadResult};
pub use config::{DownloaderConfig, TransportConfig};
pub use error::{DownloadError, PipelineStage};
