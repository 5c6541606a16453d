// Manifest fetching and validation.

use tracing::info;

use crate::config::MANIFEST_FILENAME;
use crate::error::{DownloadError, PipelineStage};
use crate::source::http_source::HttpSource;

/// One file of the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Forward-slash separated path inside the bundle.
    pub relative_path: String,
    pub url: String,
}

/// Parse a manifest body into entries rooted at `base_url`.
///
/// Lines may end in `\n` or `\r\n`; blank lines are skipped and order is kept.
pub fn parse_manifest(body: &str, base_url: &str) -> Vec<ManifestEntry> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| ManifestEntry {
            relative_path: line.to_string(),
            url: format!("{}{}", base_url, line),
        })
        .collect()
}

/// Entry paths must stay inside the destination.
fn check_entry_path(path: &str) -> Result<(), DownloadError> {
    let escapes = path.starts_with('/')
        || path.contains('\\')
        || path.contains(':')
        || path.split('/').any(|seg| seg == "..");
    if escapes {
        return Err(DownloadError::ManifestInvalid(format!(
            "entry {} escapes the destination directory",
            path
        )));
    }
    Ok(())
}

/// Check the manifest lists itself and every path is safe to write.
pub fn validate_manifest(entries: &[ManifestEntry]) -> Result<(), DownloadError> {
    if !entries.iter().any(|e| e.relative_path == MANIFEST_FILENAME) {
        return Err(DownloadError::ManifestInvalid(format!(
            "{} does not list itself",
            MANIFEST_FILENAME
        )));
    }
    for entry in entries {
        check_entry_path(&entry.relative_path)?;
    }
    Ok(())
}

/// Fetch `<base_url>files.txt` and return its validated entries.
pub async fn fetch_manifest(
    source: &HttpSource,
    base_url: &str,
) -> Result<Vec<ManifestEntry>, DownloadError> {
    let url = format!("{}{}", base_url, MANIFEST_FILENAME);
    let resp = source.get(&url, PipelineStage::FetchingManifest).await?;
    let body = resp.text().await.map_err(|e| {
        DownloadError::fetch(PipelineStage::FetchingManifest, url.as_str(), e.to_string())
    })?;

    let entries = parse_manifest(&body, base_url);
    validate_manifest(&entries)?;
    info!("manifest {} lists {} files", url, entries.len());
    Ok(entries)
}
