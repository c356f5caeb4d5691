use axum::Json;
use serde::Serialize;
use shared::cache::CacheConfig;

#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub version: String,
    pub cache: String,
}

/// The cache version this build was compiled with, for checking a deploy
pub async fn version() -> Json<VersionInfo> {
    let config = CacheConfig::default();
    Json(VersionInfo {
        cache: config.cache_name(),
        version: config.version,
    })
}
