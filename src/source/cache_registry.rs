use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use super::http_source::HttpSource;
use super::traits::{CacheInfo, CacheRegistry};

#[derive(Debug, Deserialize)]
struct CacheList {
    #[serde(default)]
    caches: Vec<CacheEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    cache_domain: String,
}

/// Cache registry backed by the published `caches.json` document.
pub struct HttpCacheRegistry {
    source: HttpSource,
    caches_url: String,
}

impl HttpCacheRegistry {
    pub fn new(source: HttpSource, caches_url: impl Into<String>) -> Self {
        Self {
            source,
            caches_url: caches_url.into(),
        }
    }
}

fn select_cache(list: CacheList, cache_id: &str) -> Option<CacheInfo> {
    list.caches
        .into_iter()
        .find(|c| c.id == cache_id)
        .map(|c| CacheInfo {
            id: c.id,
            name: c.name,
            cache_domain: c.cache_domain,
        })
}

#[async_trait]
impl CacheRegistry for HttpCacheRegistry {
    async fn find_cache(&self, cache_id: &str) -> Result<Option<CacheInfo>> {
        let list: CacheList = self.source.get_json(&self.caches_url).await?;
        Ok(select_cache(list, cache_id))
    }
}
