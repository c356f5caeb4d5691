use std::{cell::RefCell, rc::Rc};

use console_error_panic_hook::set_once as set_panic_hook;
use js_sys::{Array, Error as JsError, Promise};
use shared::{
    cache::{CacheConfig, FetchRequest, OfflineCache, WorkerScope},
    error::{describe_js_value, CacheError},
    utils::tracing::configure_tracing_once as configure_tracing,
};
use tracing::{debug, trace};
use wasm_bindgen::{prelude::wasm_bindgen, JsCast, JsValue};
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{
    Cache, CacheStorage, Request, RequestDestination, Response,
    ServiceWorkerGlobalScope,
};

async fn get_cache(caches: &CacheStorage, name: &str) -> Result<Cache, JsValue> {
    let cache: Cache = JsFuture::from(caches.open(name)).await?.into();
    Ok(cache)
}

fn into_response(value: JsValue) -> Result<Response, CacheError> {
    value.dyn_into::<Response>().map_err(|v| {
        CacheError::Js(format!(
            "Fetch returned something other than a Response: {:?}",
            v
        ))
    })
}

fn to_js(e: CacheError) -> JsValue {
    JsError::new(&e.to_string()).into()
}

pub struct WebRequest(Request);

impl FetchRequest for WebRequest {
    fn url(&self) -> String {
        self.0.url()
    }

    fn is_document(&self) -> bool {
        self.0.destination() == RequestDestination::Document
    }
}

/// The real worker global scope
pub struct WebScope {
    sw: ServiceWorkerGlobalScope,
}

impl WebScope {
    pub fn new(sw: ServiceWorkerGlobalScope) -> Self {
        Self { sw }
    }

    fn caches(&self) -> Result<CacheStorage, CacheError> {
        Ok(self.sw.caches()?)
    }
}

impl WorkerScope for WebScope {
    type Request = WebRequest;
    type Response = Response;

    async fn open_cache(&self, name: &str) -> Result<(), CacheError> {
        get_cache(&self.caches()?, name).await?;
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>, CacheError> {
        let keys: Array = JsFuture::from(self.caches()?.keys()).await?.into();
        Ok(keys.iter().filter_map(|k| k.as_string()).collect())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool, CacheError> {
        let deleted = JsFuture::from(self.caches()?.delete(name)).await?;
        Ok(deleted.as_bool().unwrap_or(false))
    }

    async fn cache_put(&self, name: &str, url: &str, response: Response) -> Result<(), CacheError> {
        let cache = get_cache(&self.caches()?, name).await?;
        JsFuture::from(cache.put_with_str(url, &response)).await?;
        Ok(())
    }

    async fn cache_match(&self, name: &str, url: &str) -> Result<Option<Response>, CacheError> {
        let cache = get_cache(&self.caches()?, name).await?;
        let cached = JsFuture::from(cache.match_with_str(url)).await?;

        // Resolves to undefined on a miss
        if cached.is_instance_of::<Response>() {
            Ok(Some(cached.into()))
        } else {
            Ok(None)
        }
    }

    async fn cache_match_request(
        &self,
        name: &str,
        request: &WebRequest,
    ) -> Result<Option<Response>, CacheError> {
        let cache = get_cache(&self.caches()?, name).await?;
        // Matching on the Request keeps its method, so only GETs can hit
        let cached = JsFuture::from(cache.match_with_request(&request.0)).await?;

        if cached.is_instance_of::<Response>() {
            Ok(Some(cached.into()))
        } else {
            Ok(None)
        }
    }

    async fn fetch(&self, request: &WebRequest) -> Result<Response, CacheError> {
        let response = JsFuture::from(self.sw.fetch_with_request(&request.0))
            .await
            .map_err(|e| CacheError::Network {
                url: request.url(),
                message: describe_js_value(&e),
            })?;
        into_response(response)
    }

    async fn fetch_asset(&self, url: &str) -> Result<Response, CacheError> {
        let response = JsFuture::from(self.sw.fetch_with_str(url))
            .await
            .map_err(|e| CacheError::Network {
                url: url.to_string(),
                message: describe_js_value(&e),
            })?;
        let response = into_response(response)?;

        if !response.ok() {
            return Err(CacheError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }

    async fn skip_waiting(&self) -> Result<(), CacheError> {
        JsFuture::from(self.sw.skip_waiting()?).await?;
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), CacheError> {
        JsFuture::from(self.sw.clients().claim()).await?;
        Ok(())
    }
}

thread_local! {
    static WORKER: RefCell<Option<Rc<OfflineCache<WebScope>>>> = const { RefCell::new(None) };
}

/// The worker for this global, created on the first event. The loader may pass
/// the deployed version, otherwise the one compiled in is used
fn worker(sw: ServiceWorkerGlobalScope, version: Option<String>) -> Rc<OfflineCache<WebScope>> {
    let config = version
        .filter(|v| !v.is_empty())
        .map(CacheConfig::with_version)
        .unwrap_or_default();

    WORKER.with(|cell| {
        let mut slot = cell.borrow_mut();
        match slot.as_ref() {
            Some(worker) if worker.config() == &config => worker.clone(),
            _ => {
                debug!(cache = %config.cache_name(), "Starting worker");
                let worker = Rc::new(OfflineCache::new(WebScope::new(sw), config));
                *slot = Some(worker.clone());
                worker
            }
        }
    })
}

async fn install(sw: ServiceWorkerGlobalScope, version: Option<String>) -> Result<JsValue, JsValue> {
    let worker = worker(sw, version);
    worker.install().await.map_err(to_js)?;
    Ok(JsValue::undefined())
}

#[wasm_bindgen]
pub fn worker_install(sw: ServiceWorkerGlobalScope, version: Option<String>) -> Promise {
    set_panic_hook();
    configure_tracing();

    future_to_promise(install(sw, version))
}

async fn activate(sw: ServiceWorkerGlobalScope, version: Option<String>) -> Result<JsValue, JsValue> {
    let worker = worker(sw, version);
    worker.activate().await.map_err(to_js)?;
    Ok(JsValue::undefined())
}

#[wasm_bindgen]
pub fn worker_activate(sw: ServiceWorkerGlobalScope, version: Option<String>) -> Promise {
    set_panic_hook();
    configure_tracing();

    future_to_promise(activate(sw, version))
}

async fn fetch(
    sw: ServiceWorkerGlobalScope,
    version: Option<String>,
    request: Request,
) -> Result<JsValue, JsValue> {
    let worker = worker(sw, version);
    trace!(
        state = ?worker.state(),
        "worker_fetch_response called: {}, {}",
        request.method(),
        request.url()
    );

    let request = WebRequest(request);
    let response = worker.fetch(&request).await.map_err(to_js)?.into_inner();
    Ok(JsValue::from(response))
}

/// Resolves to the response for an intercepted request, for `respondWith`
#[wasm_bindgen]
pub fn worker_fetch_response(
    sw: ServiceWorkerGlobalScope,
    version: Option<String>,
    request: Request,
) -> Promise {
    set_panic_hook();
    configure_tracing();

    future_to_promise(fetch(sw, version, request))
}
