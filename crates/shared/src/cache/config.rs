use serde::{Deserialize, Serialize};

pub const CACHE_PREFIX: &str = "fitness-tracker";

/// Version baked into the worker, overridable at build time
pub const CACHE_VERSION: &str = match option_env!("CACHE_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// Everything the page needs for a cold offline load
pub const ASSET_MANIFEST: &[&str] = &[
    "./",
    "./index.html",
    "./manifest.json",
    "./icon-16.png",
    "./icon-32.png",
    "./icon-180.png",
    "./icon-192.png",
    "./icon-512.png",
    "./wasm/client.js",
    "./wasm/client_bg.wasm",
    "./wasm/service_worker.js",
    "./wasm/service_worker_bg.wasm",
];

/// The worker's own wasm module, loaded from the cache before the network
pub const WORKER_MODULE: &str = "./wasm/service_worker_bg.wasm";

/// Served to document requests when both the cache and the network fail
pub const OFFLINE_DOCUMENT: &str = "./";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    pub prefix: String,
    pub version: String,
    pub manifest: Vec<String>,
    pub offline_document: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::with_version(CACHE_VERSION)
    }
}

impl CacheConfig {
    pub fn with_version<V: Into<String>>(version: V) -> Self {
        Self {
            prefix: CACHE_PREFIX.to_string(),
            version: version.into(),
            manifest: ASSET_MANIFEST.iter().map(|s| s.to_string()).collect(),
            offline_document: OFFLINE_DOCUMENT.to_string(),
        }
    }

    /// Name of the cache region holding this version's assets
    pub fn cache_name(&self) -> String {
        format!("{}-v{}", self.prefix, self.version)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_cache_name_embeds_version() {
        assert_eq!(CacheConfig::with_version("1.0.2").cache_name(), "fitness-tracker-v1.0.2");
    }

    #[test]
    fn test_manifest_includes_offline_document() {
        let config = CacheConfig::default();
        assert!(config.manifest.contains(&config.offline_document));
        assert_eq!(config.version, CACHE_VERSION);
    }

    #[test]
    fn test_manifest_includes_wasm_bundles() {
        for bundle in [
            "./wasm/client.js",
            "./wasm/client_bg.wasm",
            "./wasm/service_worker.js",
            WORKER_MODULE,
        ] {
            assert!(ASSET_MANIFEST.contains(&bundle), "{bundle} is not cached");
        }
    }
}
