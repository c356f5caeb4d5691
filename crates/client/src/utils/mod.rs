use std::fmt::Display;

use wasm_bindgen::JsValue;
use web_sys::js_sys::Error as JsError;

pub mod browser;

/// Converts an error into a thrown JS `Error` carrying its message
pub fn to_js_error<E: Display>(e: E) -> JsValue {
    JsError::new(&e.to_string()).into()
}
