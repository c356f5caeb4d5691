use gloo::utils::window;
use shared::error::CacheError;
use wasm_bindgen_futures::JsFuture;
use web_sys::ServiceWorkerRegistration;

pub async fn register_service_worker(url: &str) -> Result<ServiceWorkerRegistration, CacheError> {
    let sw = window().navigator().service_worker();
    Ok(JsFuture::from(sw.register(url)).await?.into())
}
