// Destination validation: make sure the target directory exists and is usable.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::error::{DownloadError, PipelineStage};

const STAGE: PipelineStage = PipelineStage::Validating;

/// Expand a leading `~` segment to the home directory. Windows paths are left alone.
pub fn expand_home(path: &str) -> PathBuf {
    if cfg!(windows) {
        return PathBuf::from(path);
    }
    let rest = if path == "~" {
        Some("")
    } else {
        path.strip_prefix("~/")
    };
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Ensure `dest` is an existing, readable and writable directory, creating it if absent.
pub async fn ensure_destination(dest: &str) -> Result<PathBuf, DownloadError> {
    if dest.trim().is_empty() {
        return Err(DownloadError::configuration(
            STAGE,
            "destination directory is required",
        ));
    }
    let path = expand_home(dest);

    let exists = fs::try_exists(&path).await.map_err(|e| {
        DownloadError::configuration(
            STAGE,
            format!("cannot access destination {}: {}", path.display(), e),
        )
    })?;
    if exists {
        debug!("destination {} already exists", path.display());
    } else {
        info!("creating destination {}", path.display());
        fs::create_dir_all(&path).await.map_err(|e| {
            DownloadError::configuration(
                STAGE,
                format!("cannot create destination {}: {}", path.display(), e),
            )
        })?;
    }

    check_access(&path).await?;
    Ok(path)
}

async fn check_access(path: &Path) -> Result<(), DownloadError> {
    let meta = fs::metadata(path).await.map_err(|e| {
        DownloadError::configuration(
            STAGE,
            format!("cannot access destination {}: {}", path.display(), e),
        )
    })?;
    if !meta.is_dir() {
        return Err(DownloadError::configuration(
            STAGE,
            format!("destination {} is not a directory", path.display()),
        ));
    }
    fs::read_dir(path).await.map_err(|e| {
        DownloadError::configuration(
            STAGE,
            format!("destination {} is not readable: {}", path.display(), e),
        )
    })?;

    // Permission bits say nothing about the current user, so create and drop a file.
    let dir = path.to_path_buf();
    let writable = tokio::task::spawn_blocking(move || tempfile::tempfile_in(&dir))
        .await
        .map_err(|e| DownloadError::configuration(STAGE, e.to_string()))?;
    writable.map_err(|e| {
        DownloadError::configuration(
            STAGE,
            format!("destination {} is not writable: {}", path.display(), e),
        )
    })?;
    Ok(())
}
