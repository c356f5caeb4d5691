//! Versioned asset cache run by the service worker.
//!
//! Lifecycle: `install` fills a cache region named after the version with the
//! asset manifest, `activate` deletes every other region and takes over open
//! pages, and `fetch` answers requests cache first, network second, with the
//! cached root document as a last resort for page loads.

use std::cell::Cell;

use tracing::{debug, error, info, trace, warn};

use crate::error::{CacheError, ErrorContext, ResultContext};

mod config;
pub use config::*;

/// The parts of an intercepted request the protocol looks at
pub trait FetchRequest {
    fn url(&self) -> String;
    /// True for top level page loads
    fn is_document(&self) -> bool;
}

/// Host environment operations the protocol needs
#[allow(async_fn_in_trait)]
pub trait WorkerScope {
    type Request: FetchRequest;
    type Response;

    /// Opens (creating if needed) a named cache region
    async fn open_cache(&self, name: &str) -> Result<(), CacheError>;
    async fn cache_names(&self) -> Result<Vec<String>, CacheError>;
    async fn delete_cache(&self, name: &str) -> Result<bool, CacheError>;
    async fn cache_put(
        &self,
        name: &str,
        url: &str,
        response: Self::Response,
    ) -> Result<(), CacheError>;
    async fn cache_match(&self, name: &str, url: &str)
        -> Result<Option<Self::Response>, CacheError>;
    /// Looks up an intercepted request. Only a stored response for the same
    /// method counts as a hit
    async fn cache_match_request(
        &self,
        name: &str,
        request: &Self::Request,
    ) -> Result<Option<Self::Response>, CacheError>;

    /// Forwards an intercepted request to the network as is
    async fn fetch(&self, request: &Self::Request) -> Result<Self::Response, CacheError>;
    /// Fetches a manifest asset. Anything but a successful response is an error
    async fn fetch_asset(&self, url: &str) -> Result<Self::Response, CacheError>;

    async fn skip_waiting(&self) -> Result<(), CacheError>;
    async fn claim_clients(&self) -> Result<(), CacheError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; the host will retry with a fresh worker
    Redundant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    pub cache: String,
    pub assets: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activated {
    pub cache: String,
    pub deleted: Vec<String>,
}

/// Where a fetch response came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Served<R> {
    Cache(R),
    Network(R),
    Offline(R),
}

impl<R> Served<R> {
    pub fn into_inner(self) -> R {
        match self {
            Served::Cache(r) | Served::Network(r) | Served::Offline(r) => r,
        }
    }
}

/// One per worker global; the lifecycle state carries over between events
pub struct OfflineCache<W> {
    scope: W,
    config: CacheConfig,
    state: Cell<WorkerState>,
}

impl<W: WorkerScope> OfflineCache<W> {
    pub fn new(scope: W, config: CacheConfig) -> Self {
        Self {
            scope,
            config,
            state: Cell::new(WorkerState::Parsed),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn scope(&self) -> &W {
        &self.scope
    }

    /// Fetches the whole manifest before writing any of it, so a single failed
    /// asset leaves the region empty and fails the install
    async fn populate(&self, cache: &str) -> Result<usize, CacheError> {
        self.scope
            .open_cache(cache)
            .await
            .with_context(|| format!("caches::open:: {cache}"))?;

        let mut responses = Vec::with_capacity(self.config.manifest.len());
        for url in self.config.manifest.iter() {
            let response = self
                .scope
                .fetch_asset(url)
                .await
                .with_context(|| format!("fetch:: {url}"))?;
            responses.push((url, response));
        }

        let assets = responses.len();
        for (url, response) in responses {
            self.scope
                .cache_put(cache, url, response)
                .await
                .with_context(|| format!("cache::put:: {url}"))?;
            trace!(file = %url, "Cached");
        }

        Ok(assets)
    }

    pub async fn install(&self) -> Result<Installed, CacheError> {
        let cache = self.config.cache_name();
        info!(%cache, "Service worker installing");
        self.state.set(WorkerState::Installing);

        let assets = match self.populate(&cache).await {
            Ok(assets) => assets,
            Err(e) => {
                error!(%cache, "Install failed: {e}");
                self.state.set(WorkerState::Redundant);
                return Err(e);
            }
        };
        self.state.set(WorkerState::Installed);

        // Take over straight away rather than waiting for old pages to close
        self.scope.skip_waiting().await.context("sw::skip_waiting")?;

        info!(%cache, assets, "Install successful");
        Ok(Installed { cache, assets })
    }

    pub async fn activate(&self) -> Result<Activated, CacheError> {
        let cache = self.config.cache_name();
        info!(%cache, "Service worker activating");
        self.state.set(WorkerState::Activating);

        let mut deleted = Vec::new();
        for name in self.scope.cache_names().await.context("caches::keys")? {
            if name != cache {
                info!("Deleting old cache: {name}");
                self.scope
                    .delete_cache(&name)
                    .await
                    .with_context(|| format!("caches::delete:: {name}"))?;
                deleted.push(name);
            }
        }

        self.scope
            .claim_clients()
            .await
            .context("sw::clients::claim")?;

        self.state.set(WorkerState::Activated);
        Ok(Activated { cache, deleted })
    }

    pub async fn fetch(&self, request: &W::Request) -> Result<Served<W::Response>, CacheError> {
        let cache = self.config.cache_name();
        let url = request.url();

        match self.scope.cache_match_request(&cache, request).await {
            Ok(Some(response)) => {
                debug!("HIT: {url}");
                return Ok(Served::Cache(response));
            }
            Ok(None) => debug!("MISS: {url}"),
            Err(e) => warn!("Cache lookup failed for {url}: {e}"),
        }

        let network_error = match self.scope.fetch(request).await {
            Ok(response) => return Ok(Served::Network(response)),
            Err(e) => e,
        };

        if !request.is_document() {
            return Err(network_error);
        }

        let offline = &self.config.offline_document;
        match self.scope.cache_match(&cache, offline).await {
            Ok(Some(response)) => {
                warn!("Serving offline document for {url}: {network_error}");
                Ok(Served::Offline(response))
            }
            Ok(None) => Err(CacheError::NotCached(offline.clone()).context(network_error.to_string())),
            Err(e) => Err(e.context(network_error.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use std::{
        cell::{Cell, RefCell},
        collections::{BTreeMap, HashMap, HashSet},
    };

    use tokio_test::block_on;

    use super::*;

    struct TestRequest {
        method: &'static str,
        url: String,
        document: bool,
    }

    impl TestRequest {
        fn asset(url: &str) -> Self {
            Self {
                method: "GET",
                url: url.to_string(),
                document: false,
            }
        }

        fn document(url: &str) -> Self {
            Self {
                method: "GET",
                url: url.to_string(),
                document: true,
            }
        }

        fn post(url: &str) -> Self {
            Self {
                method: "POST",
                url: url.to_string(),
                document: false,
            }
        }
    }

    impl FetchRequest for TestRequest {
        fn url(&self) -> String {
            self.url.clone()
        }

        fn is_document(&self) -> bool {
            self.document
        }
    }

    #[derive(Default)]
    struct MemoryScope {
        caches: RefCell<BTreeMap<String, HashMap<String, String>>>,
        network: RefCell<HashMap<String, String>>,
        missing: RefCell<HashSet<String>>,
        offline: Cell<bool>,
        skipped_waiting: Cell<bool>,
        claimed: Cell<bool>,
    }

    impl MemoryScope {
        fn serving(urls: &[&str]) -> Self {
            let scope = Self::default();
            for url in urls {
                scope
                    .network
                    .borrow_mut()
                    .insert(url.to_string(), format!("live {url}"));
            }
            scope
        }

        fn cached(&self, cache: &str) -> Option<HashMap<String, String>> {
            self.caches.borrow().get(cache).cloned()
        }
    }

    impl WorkerScope for MemoryScope {
        type Request = TestRequest;
        type Response = String;

        async fn open_cache(&self, name: &str) -> Result<(), CacheError> {
            self.caches.borrow_mut().entry(name.to_string()).or_default();
            Ok(())
        }

        async fn cache_names(&self) -> Result<Vec<String>, CacheError> {
            Ok(self.caches.borrow().keys().cloned().collect())
        }

        async fn delete_cache(&self, name: &str) -> Result<bool, CacheError> {
            Ok(self.caches.borrow_mut().remove(name).is_some())
        }

        async fn cache_put(&self, name: &str, url: &str, response: String) -> Result<(), CacheError> {
            self.caches
                .borrow_mut()
                .get_mut(name)
                .ok_or_else(|| CacheError::Js(format!("no cache {name}")))?
                .insert(url.to_string(), response);
            Ok(())
        }

        async fn cache_match(&self, name: &str, url: &str) -> Result<Option<String>, CacheError> {
            Ok(self
                .caches
                .borrow()
                .get(name)
                .and_then(|c| c.get(url).cloned()))
        }

        async fn cache_match_request(
            &self,
            name: &str,
            request: &TestRequest,
        ) -> Result<Option<String>, CacheError> {
            if request.method != "GET" {
                return Ok(None);
            }
            self.cache_match(name, &request.url).await
        }

        async fn fetch(&self, request: &TestRequest) -> Result<String, CacheError> {
            if self.offline.get() {
                return Err(CacheError::Network {
                    url: request.url.clone(),
                    message: "offline".to_string(),
                });
            }
            Ok(self
                .network
                .borrow()
                .get(&request.url)
                .map(|body| format!("{} {body}", request.method))
                .unwrap_or_else(|| "404".to_string()))
        }

        async fn fetch_asset(&self, url: &str) -> Result<String, CacheError> {
            if self.offline.get() {
                return Err(CacheError::Network {
                    url: url.to_string(),
                    message: "offline".to_string(),
                });
            }
            if self.missing.borrow().contains(url) {
                return Err(CacheError::Status {
                    url: url.to_string(),
                    status: 404,
                });
            }
            self.network
                .borrow()
                .get(url)
                .cloned()
                .ok_or_else(|| CacheError::Status {
                    url: url.to_string(),
                    status: 404,
                })
        }

        async fn skip_waiting(&self) -> Result<(), CacheError> {
            self.skipped_waiting.set(true);
            Ok(())
        }

        async fn claim_clients(&self) -> Result<(), CacheError> {
            self.claimed.set(true);
            Ok(())
        }
    }

    fn config(version: &str) -> CacheConfig {
        CacheConfig {
            prefix: "fitness-tracker".to_string(),
            version: version.to_string(),
            manifest: vec!["./".to_string(), "./index.html".to_string(), "./icon-16.png".to_string()],
            offline_document: "./".to_string(),
        }
    }

    fn worker(version: &str) -> OfflineCache<MemoryScope> {
        OfflineCache::new(
            MemoryScope::serving(&["./", "./index.html", "./icon-16.png", "./app.js"]),
            config(version),
        )
    }

    #[test]
    fn test_install_caches_manifest_and_skips_waiting() {
        let worker = worker("1.0.2");

        let installed = block_on(worker.install()).unwrap();

        assert_eq!(
            installed,
            Installed {
                cache: "fitness-tracker-v1.0.2".to_string(),
                assets: 3
            }
        );
        assert_eq!(worker.state(), WorkerState::Installed);
        assert!(worker.scope().skipped_waiting.get());
        let cached = worker.scope().cached("fitness-tracker-v1.0.2").unwrap();
        assert_eq!(cached.len(), 3);
        assert_eq!(cached["./index.html"], "live ./index.html");
    }

    #[test]
    fn test_install_fails_whole_when_one_asset_fails() {
        let worker = worker("1.0.2");
        worker.scope().missing.borrow_mut().insert("./icon-16.png".to_string());

        let err = block_on(worker.install()).unwrap_err();

        assert!(err.to_string().contains("./icon-16.png"));
        assert_eq!(worker.state(), WorkerState::Redundant);
        assert!(!worker.scope().skipped_waiting.get());
        assert!(worker
            .scope()
            .cached("fitness-tracker-v1.0.2")
            .unwrap_or_default()
            .is_empty());
    }

    #[test]
    fn test_activate_deletes_other_versions_and_claims() {
        let old = worker("1.0.1");
        block_on(old.install()).unwrap();
        let scope = old.scope;
        scope.caches.borrow_mut().insert("unrelated".to_string(), HashMap::new());

        let new = OfflineCache::new(scope, config("1.0.2"));
        block_on(new.install()).unwrap();
        let activated = block_on(new.activate()).unwrap();

        assert_eq!(
            activated.deleted,
            vec!["fitness-tracker-v1.0.1".to_string(), "unrelated".to_string()]
        );
        assert_eq!(
            block_on(new.scope().cache_names()).unwrap(),
            vec!["fitness-tracker-v1.0.2".to_string()]
        );
        assert!(new.scope().claimed.get());
        assert_eq!(new.state(), WorkerState::Activated);
    }

    #[test]
    fn test_fetch_prefers_cache() {
        let worker = worker("1.0.2");
        block_on(worker.install()).unwrap();
        worker
            .scope()
            .network
            .borrow_mut()
            .insert("./index.html".to_string(), "newer".to_string());

        let served = block_on(worker.fetch(&TestRequest::asset("./index.html"))).unwrap();

        assert_eq!(served, Served::Cache("live ./index.html".to_string()));
    }

    #[test]
    fn test_fetch_falls_through_to_network_on_miss() {
        let worker = worker("1.0.2");
        block_on(worker.install()).unwrap();

        let served = block_on(worker.fetch(&TestRequest::asset("./app.js"))).unwrap();

        assert_eq!(served, Served::Network("GET live ./app.js".to_string()));
    }

    #[test]
    fn test_fetch_only_hits_cache_for_same_method() {
        let worker = worker("1.0.2");
        block_on(worker.install()).unwrap();

        let served = block_on(worker.fetch(&TestRequest::post("./index.html"))).unwrap();

        assert_eq!(served, Served::Network("POST live ./index.html".to_string()));
    }

    #[test]
    fn test_state_carries_across_lifecycle_events() {
        let worker = worker("1.0.2");
        assert_eq!(worker.state(), WorkerState::Parsed);

        block_on(worker.install()).unwrap();
        block_on(worker.fetch(&TestRequest::asset("./index.html"))).unwrap();
        assert_eq!(worker.state(), WorkerState::Installed);

        block_on(worker.activate()).unwrap();
        block_on(worker.fetch(&TestRequest::asset("./index.html"))).unwrap();
        assert_eq!(worker.state(), WorkerState::Activated);
    }

    #[test]
    fn test_fetch_offline_document_falls_back_to_root() {
        let worker = worker("1.0.2");
        block_on(worker.install()).unwrap();
        worker.scope().offline.set(true);

        let served = block_on(worker.fetch(&TestRequest::document("./exercises/today"))).unwrap();

        assert_eq!(served, Served::Offline("live ./".to_string()));
        assert_eq!(served.into_inner(), "live ./");
    }

    #[test]
    fn test_fetch_offline_asset_propagates_failure() {
        let worker = worker("1.0.2");
        block_on(worker.install()).unwrap();
        worker.scope().offline.set(true);

        let err = block_on(worker.fetch(&TestRequest::asset("./app.js"))).unwrap_err();

        assert!(matches!(err, CacheError::Network { .. }));
    }

    #[test]
    fn test_fetch_offline_document_without_cache_fails() {
        let worker = worker("1.0.2");
        worker.scope().offline.set(true);

        let err = block_on(worker.fetch(&TestRequest::document("./"))).unwrap_err();

        assert!(matches!(err, CacheError::WithContext { .. }));
    }
}
