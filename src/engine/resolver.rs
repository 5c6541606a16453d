// Version and origin resolution: turns request hints into a concrete bundle base URL.

use reqwest::Url;
use tracing::info;

use crate::error::{DownloadError, PipelineStage};
use crate::source::traits::{CacheRegistry, VersionResolver};

const STAGE: PipelineStage = PipelineStage::ResolvingOrigin;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOrigin {
    pub version: String,
    /// Absolute, ends with `rtv/<version>/`.
    pub base_url: String,
}

/// A version can be used verbatim in a URL path only if encoding leaves it unchanged.
pub fn is_url_safe_version(version: &str) -> bool {
    // Stricter than encodeURIComponent: `!'()*` are escaped too and so rejected.
    urlencoding::encode(version) == version
}

/// Join an origin and a version into the bundle base URL.
pub fn bundle_base_url(origin: &str, version: &str) -> String {
    format!("{}/rtv/{}/", origin.trim_end_matches('/'), version)
}

fn validate_origin_prefix(prefix: &str) -> Result<(), DownloadError> {
    Url::parse(prefix).map(|_| ()).map_err(|e| {
        DownloadError::configuration(STAGE, format!("invalid origin url {}: {}", prefix, e))
    })
}

async fn resolve_version(
    requested: Option<&str>,
    origin_prefix: Option<&str>,
    versions: &dyn VersionResolver,
) -> Result<String, DownloadError> {
    if let Some(version) = requested {
        if !is_url_safe_version(version) {
            return Err(DownloadError::configuration(
                STAGE,
                format!("invalid runtime version: {}", version),
            ));
        }
        return Ok(version.to_string());
    }

    let discovered = versions
        .current_version(origin_prefix)
        .await
        .map_err(|e| DownloadError::Resolution(format!("could not determine version: {:#}", e)))?;
    match discovered {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DownloadError::Resolution(
            "could not determine version".to_string(),
        )),
    }
}

async fn resolve_origin(
    requested: Option<&str>,
    cache_id: &str,
    caches: &dyn CacheRegistry,
) -> Result<String, DownloadError> {
    if let Some(prefix) = requested {
        return Ok(prefix.to_string());
    }

    let cache = caches.find_cache(cache_id).await.map_err(|e| {
        DownloadError::Resolution(format!("could not look up cache {}: {:#}", cache_id, e))
    })?;
    let host = cache
        .map(|c| c.cache_domain)
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| {
            DownloadError::Resolution(format!("could not determine host for cache {}", cache_id))
        })?;
    let origin = format!("https://{}", host.trim());
    Url::parse(&origin).map_err(|e| {
        DownloadError::Resolution(format!("cache host {} is not a valid url: {}", host, e))
    })?;
    Ok(origin)
}

/// Resolve the (version, base URL) pair for this run.
pub async fn resolve(
    version: Option<&str>,
    origin_prefix: Option<&str>,
    cache_id: &str,
    versions: &dyn VersionResolver,
    caches: &dyn CacheRegistry,
) -> Result<ResolvedOrigin, DownloadError> {
    if let Some(prefix) = origin_prefix {
        validate_origin_prefix(prefix)?;
    }
    let version = resolve_version(version, origin_prefix, versions).await?;
    let origin = resolve_origin(origin_prefix, cache_id, caches).await?;
    let base_url = bundle_base_url(&origin, &version);
    info!("resolved version={} base_url={}", version, base_url);
    Ok(ResolvedOrigin { version, base_url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::traits::CacheInfo;
    use anyhow::Result;
    use async_trait::async_trait;

    struct FixedVersion(Option<&'static str>);

    #[async_trait]
    impl VersionResolver for FixedVersion {
        async fn current_version(&self, _origin_prefix: Option<&str>) -> Result<Option<String>> {
            Ok(self.0.map(str::to_string))
        }
    }

    struct FixedCache(Option<&'static str>);

    #[async_trait]
    impl CacheRegistry for FixedCache {
        async fn find_cache(&self, cache_id: &str) -> Result<Option<CacheInfo>> {
            Ok(self.0.map(|domain| CacheInfo {
                id: cache_id.to_string(),
                name: String::new(),
                cache_domain: domain.to_string(),
            }))
        }
    }

    #[test]
    fn test_base_url_single_slash() {
        assert_eq!(
            bundle_base_url("https://example.com", "15"),
            "https://example.com/rtv/15/"
        );
        assert_eq!(
            bundle_base_url("https://example.com//", "15"),
            "https://example.com/rtv/15/"
        );
    }

    #[test]
    fn test_url_safe_version() {
        assert!(is_url_safe_version("012105150310000"));
        assert!(!is_url_safe_version("01 2"));
        assert!(!is_url_safe_version("a/b"));
        assert!(!is_url_safe_version("15!"));
    }

    #[tokio::test]
    async fn test_explicit_version_and_prefix() {
        let resolved = resolve(
            Some("15"),
            Some("https://example.com"),
            "google",
            &FixedVersion(None),
            &FixedCache(None),
        )
        .await
        .unwrap();
        assert_eq!(resolved.version, "15");
        assert_eq!(resolved.base_url, "https://example.com/rtv/15/");
    }

    #[tokio::test]
    async fn test_discovered_version_and_cache_host() {
        let resolved = resolve(
            None,
            None,
            "google",
            &FixedVersion(Some("0123")),
            &FixedCache(Some("cdn.ampproject.org")),
        )
        .await
        .unwrap();
        assert_eq!(resolved.base_url, "https://cdn.ampproject.org/rtv/0123/");
    }

    #[tokio::test]
    async fn test_invalid_version_is_configuration_error() {
        let err = resolve(
            Some("1 5"),
            Some("https://example.com"),
            "google",
            &FixedVersion(None),
            &FixedCache(None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DownloadError::Configuration { .. }));
        assert!(err.to_string().contains("invalid runtime version"));
    }

    #[tokio::test]
    async fn test_relative_prefix_rejected() {
        let err = resolve(
            Some("15"),
            Some("/not/absolute"),
            "google",
            &FixedVersion(None),
            &FixedCache(None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DownloadError::Configuration { .. }));
    }

    #[tokio::test]
    async fn test_missing_version_and_cache() {
        let err = resolve(None, None, "google", &FixedVersion(None), &FixedCache(None))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("could not determine version"));

        let err = resolve(
            Some("15"),
            None,
            "google",
            &FixedVersion(None),
            &FixedCache(None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DownloadError::Resolution(_)));
    }
}
