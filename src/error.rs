// Pipeline error kinds. Each failure knows which stage raised it.

use serde::Serialize;
use thiserror::Error;

/// Stages of one download run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validating,
    ResolvingOrigin,
    FetchingManifest,
    PlanningDirectories,
    MaterializingFiles,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("{message}")]
    Configuration {
        stage: PipelineStage,
        message: String,
    },

    #[error("{0}")]
    Resolution(String),

    #[error("failed to fetch {url}: {message}")]
    Fetch {
        stage: PipelineStage,
        url: String,
        message: String,
    },

    #[error("invalid manifest: {0}")]
    ManifestInvalid(String),

    #[error("{message}: {source}")]
    Filesystem {
        stage: PipelineStage,
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    pub fn configuration(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self::Configuration {
            stage,
            message: message.into(),
        }
    }

    pub fn fetch(stage: PipelineStage, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            stage,
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn filesystem(
        stage: PipelineStage,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Filesystem {
            stage,
            message: message.into(),
            source,
        }
    }

    /// The stage that produced this error.
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Configuration { stage, .. }
            | Self::Fetch { stage, .. }
            | Self::Filesystem { stage, .. } => *stage,
            Self::Resolution(_) => PipelineStage::ResolvingOrigin,
            Self::ManifestInvalid(_) => PipelineStage::FetchingManifest,
        }
    }
}
