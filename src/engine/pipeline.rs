// Download pipeline state machine: runs the stages in order and folds the outcome into a result.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::destination::{ensure_destination, expand_home};
use super::manifest::fetch_manifest;
use super::materializer::FileMaterializer;
use super::planner::plan_directories;
use super::resolver::resolve;
use crate::api::download::{DownloadRequest, DownloadResult};
use crate::config::DownloaderConfig;
use crate::error::{DownloadError, PipelineStage};
use crate::source::cache_registry::HttpCacheRegistry;
use crate::source::http_source::HttpSource;
use crate::source::traits::{CacheRegistry, VersionResolver};
use crate::source::version::HttpVersionResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running(PipelineStage),
    Succeeded,
    Failed(PipelineStage),
}

pub struct BundleDownloader {
    config: DownloaderConfig,
    source: HttpSource,
    versions: Arc<dyn VersionResolver>,
    caches: Arc<dyn CacheRegistry>,
    connections: Arc<Semaphore>,
}

impl BundleDownloader {
    /// Downloader wired to the HTTP version and cache lookups.
    pub fn new(config: DownloaderConfig) -> anyhow::Result<Self> {
        let source = HttpSource::new(config.transport.clone())?;
        let versions = Arc::new(HttpVersionResolver::new(
            source.clone(),
            config.metadata_url_prefix.clone(),
        ));
        let caches = Arc::new(HttpCacheRegistry::new(
            source.clone(),
            config.caches_url.clone(),
        ));
        Ok(Self::with_collaborators(config, source, versions, caches))
    }

    pub fn with_collaborators(
        config: DownloaderConfig,
        source: HttpSource,
        versions: Arc<dyn VersionResolver>,
        caches: Arc<dyn CacheRegistry>,
    ) -> Self {
        let connections = Arc::new(Semaphore::new(config.transport.connection_limit()));
        Self {
            config,
            source,
            versions,
            caches,
            connections,
        }
    }

    /// Run one download. Never fails; the outcome is in the returned result.
    ///
    /// Not atomic: directories and files created before a failure are left behind.
    pub async fn run(&self, request: &DownloadRequest) -> DownloadResult {
        let mut result = DownloadResult::default();
        let state = match self.execute(request, &mut result).await {
            Ok(()) => PipelineState::Succeeded,
            Err(e) => {
                let stage = e.stage();
                warn!("download failed during {:?}: {}", stage, e);
                result.error = e.to_string();
                result.failed_stage = Some(stage);
                PipelineState::Failed(stage)
            }
        };
        result.success = state == PipelineState::Succeeded;
        info!(
            "download finished state={:?} files={} dest={}",
            state, result.file_count, result.destination_path
        );
        result
    }

    fn enter(&self, stage: PipelineStage) {
        info!("pipeline state {:?}", PipelineState::Running(stage));
    }

    async fn execute(
        &self,
        request: &DownloadRequest,
        result: &mut DownloadResult,
    ) -> Result<(), DownloadError> {
        self.enter(PipelineStage::Validating);
        result.destination_path = expand_home(&request.destination_path)
            .display()
            .to_string();
        let dest = ensure_destination(&request.destination_path).await?;

        self.enter(PipelineStage::ResolvingOrigin);
        let origin = resolve(
            request.version.as_deref(),
            request.origin_url_prefix.as_deref(),
            &self.config.cache_id,
            self.versions.as_ref(),
            self.caches.as_ref(),
        )
        .await?;
        result.version = origin.version.clone();
        result.origin_base_url = origin.base_url.clone();

        self.enter(PipelineStage::FetchingManifest);
        let entries = fetch_manifest(&self.source, &origin.base_url).await?;
        result.file_count = entries.len();

        self.enter(PipelineStage::PlanningDirectories);
        plan_directories(&dest, &entries, request.clear_before_write()).await?;

        self.enter(PipelineStage::MaterializingFiles);
        let materializer = FileMaterializer::new(self.source.clone(), self.connections.clone());
        materializer.materialize(&dest, &entries).await
    }
}
