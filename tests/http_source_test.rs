mod common;

use axum::http::StatusCode;

use rtv_fetch::source::cache_registry::HttpCacheRegistry;
use rtv_fetch::source::http_source::HttpSource;
use rtv_fetch::source::traits::{CacheRegistry, VersionResolver};
use rtv_fetch::source::version::HttpVersionResolver;
use rtv_fetch::{DownloadError, PipelineStage, TransportConfig};

use common::{start_origin, FakeOrigin};

fn source() -> HttpSource {
    HttpSource::new(TransportConfig {
        keep_alive: false,
        max_connections: 1,
        compress: false,
    })
    .unwrap()
}

#[tokio::test]
async fn test_get_rejects_error_status() {
    let (url, _origin) =
        start_origin(FakeOrigin::new().status("/gone", StatusCode::GONE)).await;
    let target = format!("{}/gone", url);

    let err = source()
        .get(&target, PipelineStage::FetchingManifest)
        .await
        .unwrap_err();
    match err {
        DownloadError::Fetch { url, message, stage } => {
            assert_eq!(url, target);
            assert_eq!(message, "HTTP 410");
            assert_eq!(stage, PipelineStage::FetchingManifest);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_version_from_metadata() {
    let (url, _origin) = start_origin(
        FakeOrigin::new().file("/rtv/metadata", r#"{"ampRuntimeVersion": "012105150310000"}"#),
    )
    .await;

    let resolver = HttpVersionResolver::new(source(), "https://unused.invalid");
    let version = resolver.current_version(Some(&url)).await.unwrap();
    assert_eq!(version.as_deref(), Some("012105150310000"));
}

#[tokio::test]
async fn test_version_missing_from_metadata() {
    let (url, _origin) = start_origin(FakeOrigin::new().file("/rtv/metadata", "{}")).await;

    let resolver = HttpVersionResolver::new(source(), url.clone());
    assert_eq!(resolver.current_version(None).await.unwrap(), None);
}

#[tokio::test]
async fn test_cache_registry_lookup() {
    let (url, _origin) = start_origin(FakeOrigin::new().file(
        "/caches.json",
        r#"{"caches": [{"id": "google", "name": "Google AMP Cache", "cacheDomain": "cdn.ampproject.org"}]}"#,
    ))
    .await;

    let registry = HttpCacheRegistry::new(source(), format!("{}/caches.json", url));
    let cache = registry.find_cache("google").await.unwrap().unwrap();
    assert_eq!(cache.cache_domain, "cdn.ampproject.org");
    assert!(registry.find_cache("bing").await.unwrap().is_none());
}
