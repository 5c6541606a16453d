use serde::{Deserialize, Serialize};

use crate::config::DownloaderConfig;
use crate::engine::pipeline::BundleDownloader;
use crate::error::PipelineStage;

/// What to download and where.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub destination_path: String,
    /// Remove existing destination contents first. Defaults to true.
    #[serde(default)]
    pub clear_before_write: Option<bool>,
    /// Explicit version; discovered when absent.
    #[serde(default)]
    pub version: Option<String>,
    /// Explicit origin such as `https://example.com`; looked up in the cache registry when absent.
    #[serde(default)]
    pub origin_url_prefix: Option<String>,
}

impl DownloadRequest {
    pub fn new(destination_path: impl Into<String>) -> Self {
        Self {
            destination_path: destination_path.into(),
            ..Self::default()
        }
    }

    pub fn clear_before_write(&self) -> bool {
        self.clear_before_write != Some(false)
    }
}

/// Outcome of one download run.
///
/// A failed run may still have created directories and written some files.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResult {
    pub success: bool,
    /// Empty on success.
    pub error: String,
    /// Manifest size, regardless of how many files were written.
    pub file_count: usize,
    pub origin_base_url: String,
    pub destination_path: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<PipelineStage>,
}

/// Download with the default configuration.
pub async fn download_runtime(request: &DownloadRequest) -> DownloadResult {
    download_runtime_with(DownloaderConfig::default(), request).await
}

pub async fn download_runtime_with(
    config: DownloaderConfig,
    request: &DownloadRequest,
) -> DownloadResult {
    match BundleDownloader::new(config) {
        Ok(downloader) => downloader.run(request).await,
        Err(e) => DownloadResult {
            error: format!("cannot build http client: {:#}", e),
            failed_stage: Some(PipelineStage::Validating),
            ..DownloadResult::default()
        },
    }
}
