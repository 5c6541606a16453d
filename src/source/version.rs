use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::http_source::HttpSource;
use super::traits::VersionResolver;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeMetadata {
    #[serde(default)]
    amp_runtime_version: Option<String>,
}

/// Reads the current version from `<prefix>/rtv/metadata`.
pub struct HttpVersionResolver {
    source: HttpSource,
    default_prefix: String,
}

impl HttpVersionResolver {
    pub fn new(source: HttpSource, default_prefix: impl Into<String>) -> Self {
        Self {
            source,
            default_prefix: default_prefix.into(),
        }
    }

    fn metadata_url(&self, origin_prefix: Option<&str>) -> String {
        let prefix = origin_prefix.unwrap_or(&self.default_prefix);
        format!("{}/rtv/metadata", prefix.trim_end_matches('/'))
    }
}

#[async_trait]
impl VersionResolver for HttpVersionResolver {
    async fn current_version(&self, origin_prefix: Option<&str>) -> Result<Option<String>> {
        let url = self.metadata_url(origin_prefix);
        let metadata: RuntimeMetadata = self.source.get_json(&url).await?;
        debug!("runtime metadata from {}: {:?}", url, metadata);
        Ok(metadata
            .amp_runtime_version
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }
}
