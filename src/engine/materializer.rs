// File materializer: fetches every manifest entry to disk under a shared connection ceiling.

use std::path::Path;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::hotpatch::{apply_geo_hotpatch, needs_geo_hotpatch};
use super::manifest::ManifestEntry;
use super::planner::local_path;
use super::stats::{StatsCollector, StatsSnapshot};
use crate::error::{DownloadError, PipelineStage};
use crate::source::http_source::HttpSource;

const STAGE: PipelineStage = PipelineStage::MaterializingFiles;

pub struct FileMaterializer {
    source: HttpSource,
    connections: Arc<Semaphore>,
    stats: Arc<StatsCollector>,
}

impl FileMaterializer {
    /// `connections` bounds how many files are in flight at once.
    pub fn new(source: HttpSource, connections: Arc<Semaphore>) -> Self {
        Self {
            source,
            connections,
            stats: Arc::new(StatsCollector::new()),
        }
    }

    /// Materializer with a ceiling taken from the transport config.
    pub fn from_transport(source: HttpSource) -> Self {
        let limit = source.config().connection_limit();
        Self::new(source, Arc::new(Semaphore::new(limit)))
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Fetch all entries into `dest`.
    ///
    /// Every entry is attempted even after a failure; the first failure to settle is
    /// returned once all of them have finished. Files already written stay on disk.
    pub async fn materialize(
        &self,
        dest: &Path,
        entries: &[ManifestEntry],
    ) -> Result<(), DownloadError> {
        self.stats.restart();
        let mut pending: FuturesUnordered<_> = entries
            .iter()
            .map(|entry| self.materialize_file(dest, entry))
            .collect();

        let mut first_error: Option<DownloadError> = None;
        while let Some(result) = pending.next().await {
            if let Err(e) = result {
                self.stats.record_file_failed();
                warn!("{}", e);
                first_error.get_or_insert(e);
            }
        }

        let snap = self.stats.snapshot();
        info!(
            "materialized {}/{} files ({} bytes, {} failed, peak_connections={}, elapsed_ms={}, write_bps={})",
            snap.files_written,
            entries.len(),
            snap.bytes_written,
            snap.files_failed,
            snap.peak_workers,
            snap.elapsed.as_millis(),
            snap.write_bps
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn materialize_file(
        &self,
        dest: &Path,
        entry: &ManifestEntry,
    ) -> Result<(), DownloadError> {
        let _permit = self
            .connections
            .acquire()
            .await
            .map_err(|e| DownloadError::fetch(STAGE, entry.url.as_str(), e.to_string()))?;

        self.stats.increment_workers();
        let result = self.fetch_to_disk(dest, entry).await;
        self.stats.decrement_workers();

        let written = result?;
        self.stats.record_file_written(written);
        debug!("saved {} ({} bytes)", entry.relative_path, written);
        Ok(())
    }

    async fn fetch_to_disk(&self, dest: &Path, entry: &ManifestEntry) -> Result<u64, DownloadError> {
        let resp = self.source.get(&entry.url, STAGE).await?;
        let target = local_path(dest, &entry.relative_path);
        let write_err =
            |e: std::io::Error| DownloadError::filesystem(STAGE, format!("cannot write {}", target.display()), e);

        if needs_geo_hotpatch(&entry.relative_path) {
            let body = resp
                .text()
                .await
                .map_err(|e| DownloadError::fetch(STAGE, entry.url.as_str(), e.to_string()))?;
            let patched = apply_geo_hotpatch(&body);
            debug!(
                "geo hotpatch {} applied={}",
                entry.relative_path,
                patched != body
            );
            fs::write(&target, patched.as_bytes())
                .await
                .map_err(write_err)?;
            return Ok(patched.len() as u64);
        }

        let mut file = fs::File::create(&target).await.map_err(write_err)?;
        let mut body = resp.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| DownloadError::fetch(STAGE, entry.url.as_str(), e.to_string()))?;
            file.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;
        Ok(written)
    }
}
