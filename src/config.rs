use serde::Deserialize;

/// Name of the manifest document served next to every bundle version.
pub const MANIFEST_FILENAME: &str = "files.txt";

/// Cache identifier looked up in the registry when no origin prefix is given.
pub const DEFAULT_CACHE_ID: &str = "google";

/// Where the cache registry document lives.
pub const DEFAULT_CACHES_URL: &str = "https://cdn.ampproject.org/caches.json";

/// Prefix used for version discovery when the caller supplies no origin.
pub const DEFAULT_METADATA_URL_PREFIX: &str = "https://cdn.ampproject.org";

/// Maximum number of connections open against the origin at once.
pub const DEFAULT_MAX_CONNECTIONS: usize = 6;

/// Token written over the baked-in country code of the geolocation helper.
pub const GEO_HOTPATCH_PLACEHOLDER: &str = "{{AMP_ISO_COUNTRY_HOTPATCH}}";

/// Options for the shared HTTP transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Reuse connections between requests.
    pub keep_alive: bool,
    /// Ceiling on concurrent connections shared by every file fetch.
    pub max_connections: usize,
    /// Ask the origin for compressed bodies.
    pub compress: bool,
}

impl TransportConfig {
    /// Connection ceiling, never below one.
    pub fn connection_limit(&self) -> usize {
        self.max_connections.max(1)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            keep_alive: true,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            compress: true,
        }
    }
}

/// Top-level configuration for the downloader.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    pub transport: TransportConfig,
    /// Registry entry used to find the origin host.
    pub cache_id: String,
    /// Registry document listing known caches.
    pub caches_url: String,
    /// Prefix for `rtv/metadata` when no origin prefix is requested.
    pub metadata_url_prefix: String,
}

impl DownloaderConfig {
    /// Load a TOML config file; missing keys fall back to defaults.
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            cache_id: DEFAULT_CACHE_ID.to_string(),
            caches_url: DEFAULT_CACHES_URL.to_string(),
            metadata_url_prefix: DEFAULT_METADATA_URL_PREFIX.to_string(),
        }
    }
}
