use axum::{
    http::{header::CACHE_CONTROL, HeaderName, HeaderValue},
    routing::get,
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tower::ServiceBuilder;
use tracing::Level;

use crate::{routes, Cli};

pub const VERSION_PATH: &str = "/api/version";

/// Static host for the page. The worker script is always revalidated so a
/// bumped cache version reaches browsers on their next update check
pub fn app(args: &Cli) -> Router {
    let service_worker_route = format!("/{}", args.service_worker_path.trim_start_matches('/'));
    let service_worker = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("service-worker-allowed"),
            HeaderValue::from_static("/"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .service(ServeFile::new(args.assets_dir.join(&args.service_worker_path)));

    Router::new()
        .route(VERSION_PATH, get(routes::version))
        .route_service(&service_worker_route, service_worker)
        .fallback_service(ServeDir::new(&args.assets_dir))
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod test {
    use std::{fs, path::PathBuf};

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use shared::cache::{CacheConfig, ASSET_MANIFEST};
    use tower::ServiceExt;

    use super::*;

    fn assets(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("exercise-log-{}-{name}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("index.html"), "<html>log</html>").unwrap();
        fs::write(dir.join("service_worker.js"), "// worker").unwrap();
        dir
    }

    fn cli(assets_dir: PathBuf) -> Cli {
        Cli {
            assets_dir,
            service_worker_path: "service_worker.js".to_string(),
            port: 0,
            bind_addr: "127.0.0.1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_service_worker_headers() {
        let app = app(&cli(assets("sw")));

        let response = app
            .oneshot(Request::get("/service_worker.js").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["service-worker-allowed"], "/");
        assert_eq!(response.headers()[CACHE_CONTROL], "no-cache");
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let app = app(&cli(assets("root")));

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("service-worker-allowed").is_none());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<html>log</html>");
    }

    #[tokio::test]
    async fn test_version_reports_cache_name() {
        let app = app(&cli(assets("version")));

        let response = app
            .oneshot(Request::get(VERSION_PATH).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["cache"], CacheConfig::default().cache_name());
    }

    /// The wasm bundles are build output; everything else in the manifest ships
    /// in the repo's assets dir and must be servable for install to succeed
    #[tokio::test]
    async fn test_shipped_assets_cover_manifest() {
        let shipped = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets");
        let app = app(&cli(shipped));

        for asset in ASSET_MANIFEST.iter().filter(|a| !a.starts_with("./wasm/")) {
            let uri = format!("/{}", asset.trim_start_matches("./"));
            let response = app
                .clone()
                .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }
}
