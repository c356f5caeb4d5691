use console_error_panic_hook::set_once as set_panic_hook;
use shared::utils::tracing::configure_tracing_once as configure_tracing;
use tracing::{error, info};
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen_futures::spawn_local;

mod exercise_log;
pub use exercise_log::*;

pub mod storage;
pub mod utils;

/// Path of the worker script, relative to the page
pub const SERVICE_WORKER_URL: &str = "./service_worker.js";

#[wasm_bindgen]
pub fn start_client() {
    set_panic_hook();
    configure_tracing();

    spawn_local(async {
        match utils::browser::register_service_worker(SERVICE_WORKER_URL).await {
            Ok(registration) => info!(scope = %registration.scope(), "Service worker registered"),
            // The page works without it, it just won't load offline
            Err(e) => error!("Service worker registration failed: {e}"),
        }
    });
}
