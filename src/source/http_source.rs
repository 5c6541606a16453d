use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::TransportConfig;
use crate::error::{DownloadError, PipelineStage};

/// Shared HTTP transport. Cloning is cheap and reuses the same connection pool.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
    config: TransportConfig,
}

impl HttpSource {
    pub fn new(config: TransportConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder().gzip(config.compress);
        builder = if config.keep_alive {
            builder
                .pool_max_idle_per_host(config.connection_limit())
                .tcp_keepalive(Duration::from_secs(60))
        } else {
            builder.pool_max_idle_per_host(0)
        };
        let client = builder.build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// GET `url`, failing on transport errors and non-success statuses.
    pub async fn get(&self, url: &str, stage: PipelineStage) -> Result<Response, DownloadError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::fetch(stage, url, e.to_string()))?;

        let status = resp.status();
        debug!("http get status={} url={}", status.as_u16(), url);
        if !status.is_success() {
            warn!("http get failed status={} url={}", status.as_u16(), url);
            return Err(DownloadError::fetch(
                stage,
                url,
                format!("HTTP {}", status.as_u16()),
            ));
        }
        Ok(resp)
    }

    /// GET `url` and decode a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> anyhow::Result<T> {
        let resp = self.get(url, PipelineStage::ResolvingOrigin).await?;
        Ok(resp.json::<T>().await?)
    }
}
