// Network side of the downloader: the shared transport and the version/cache lookups.

pub mod cache_registry;
pub mod http_source;
pub mod traits;
pub mod version;
