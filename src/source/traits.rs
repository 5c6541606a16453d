use anyhow::Result;
use async_trait::async_trait;

/// A cache entry from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheInfo {
    pub id: String,
    pub name: String,
    /// Host serving the cached runtime, e.g. `cdn.ampproject.org`.
    pub cache_domain: String,
}

/// Discovers the current bundle version.
#[async_trait]
pub trait VersionResolver: Send + Sync {
    /// Returns `None` when no version can be determined.
    async fn current_version(&self, origin_prefix: Option<&str>) -> Result<Option<String>>;
}

/// Looks up a cache host by identifier.
#[async_trait]
pub trait CacheRegistry: Send + Sync {
    async fn find_cache(&self, cache_id: &str) -> Result<Option<CacheInfo>>;
}
