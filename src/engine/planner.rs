// Directory planning: clear the destination and pre-create every subdirectory the manifest needs.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use super::manifest::ManifestEntry;
use crate::error::{DownloadError, PipelineStage};

const STAGE: PipelineStage = PipelineStage::PlanningDirectories;

/// Map a forward-slash bundle path onto `root` using the local separator.
pub fn local_path(root: &Path, relative: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in relative.split('/').filter(|s| !s.is_empty() && *s != ".") {
        path.push(segment);
    }
    path
}

/// Unique parent directories of all entries, excluding the bundle root.
pub fn subdirectories(entries: &[ManifestEntry]) -> BTreeSet<String> {
    entries
        .iter()
        .filter_map(|e| e.relative_path.rsplit_once('/').map(|(dir, _)| dir))
        .map(|dir| dir.trim_end_matches('/'))
        .filter(|dir| !dir.is_empty() && *dir != ".")
        .map(str::to_string)
        .collect()
}

/// Remove every direct child of `dest`. Directories go recursively.
pub async fn clear_directory(dest: &Path) -> Result<(), DownloadError> {
    let mut children = fs::read_dir(dest).await.map_err(|e| {
        DownloadError::filesystem(STAGE, format!("cannot list {}", dest.display()), e)
    })?;

    let mut removed = 0usize;
    while let Some(child) = children.next_entry().await.map_err(|e| {
        DownloadError::filesystem(STAGE, format!("cannot list {}", dest.display()), e)
    })? {
        let path = child.path();
        // Symlinks are unlinked, never followed.
        let meta = fs::symlink_metadata(&path).await.map_err(|e| {
            DownloadError::filesystem(STAGE, format!("cannot stat {}", path.display()), e)
        })?;
        let result = if meta.is_dir() {
            fs::remove_dir_all(&path).await
        } else {
            fs::remove_file(&path).await
        };
        result.map_err(|e| {
            DownloadError::filesystem(STAGE, format!("cannot remove {}", path.display()), e)
        })?;
        removed += 1;
    }

    debug!("cleared {} entries from {}", removed, dest.display());
    Ok(())
}

/// Create each subdirectory under `dest`. Already existing directories are fine.
pub async fn create_subdirectories(
    dest: &Path,
    dirs: &BTreeSet<String>,
) -> Result<(), DownloadError> {
    for dir in dirs {
        let path = local_path(dest, dir);
        fs::create_dir_all(&path).await.map_err(|e| {
            DownloadError::filesystem(STAGE, format!("cannot create {}", path.display()), e)
        })?;
    }
    Ok(())
}

/// Prepare `dest` to receive every entry.
pub async fn plan_directories(
    dest: &Path,
    entries: &[ManifestEntry],
    clear: bool,
) -> Result<BTreeSet<String>, DownloadError> {
    if clear {
        clear_directory(dest).await?;
    }
    let dirs = subdirectories(entries);
    create_subdirectories(dest, &dirs).await?;
    info!(
        "prepared {} subdirectories in {} (cleared={})",
        dirs.len(),
        dest.display(),
        clear
    );
    Ok(dirs)
}
