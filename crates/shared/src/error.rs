use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "wasm")]
pub use wasm::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub error_messages: Vec<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error_messages.join(", "))
    }
}

impl std::error::Error for ValidationError {}

/// Failures reading or writing the durable slot
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Failed to read \"{key}\": {message}")]
    Read { key: String, message: String },
    #[error("Failed to write \"{key}\": {message}")]
    Write { key: String, message: String },
    #[error("Stored value under \"{key}\" is malformed: {message}")]
    Malformed { key: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("No exercise with id {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    #[error("Js error: {0}")]
    Js(String),
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },
    #[error("Fetching {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("{0} is not cached")]
    NotCached(String),
    #[error("{context}: {inner}")]
    WithContext {
        context: String,
        inner: Box<CacheError>,
    },
}

pub trait ErrorContext<E>: Sized {
    /// Add helpful context to errors
    ///
    /// `context` is provided as a closure to avoid potential formatting cost if
    /// the result isn't an error
    #[allow(dead_code)]
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> E;
    /// Add helpful context to errors
    fn context<S: Into<String>>(self, context: S) -> E;
}

impl<E: Into<CacheError>> ErrorContext<CacheError> for E {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> CacheError {
        self.context(context())
    }
    fn context<S: Into<String>>(self, context: S) -> CacheError {
        CacheError::WithContext {
            context: context.into(),
            inner: Box::new(self.into()),
        }
    }
}

pub trait ResultContext<T, E: ErrorContext<E>> {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Result<T, E>;
    fn context<S: Into<String>>(self, context: S) -> Result<T, E>;
}

impl<T, E: ErrorContext<E>> ResultContext<T, E> for Result<T, E> {
    fn with_context<S: Into<String>, F: FnOnce() -> S>(self, context: F) -> Result<T, E> {
        self.context(context())
    }
    fn context<S: Into<String>>(self, context: S) -> Result<T, E> {
        self.map_err(|e| e.context(context))
    }
}

#[cfg(feature = "wasm")]
mod wasm {
    use js_sys::{Error as GenericJsError, Object};
    use wasm_bindgen::{JsCast, JsValue};

    use super::{CacheError, StorageError};

    /// Pulls the most useful description out of a thrown value
    pub fn describe_js_value(value: &JsValue) -> String {
        if let Some(error) = value.dyn_ref::<GenericJsError>() {
            return format!("{}: {}", String::from(error.name()), String::from(error.message()));
        }
        if let Some(s) = value.as_string() {
            return s;
        }
        if let Some(object) = value.dyn_ref::<Object>() {
            return String::from(object.to_string());
        }
        format!("{:?}", value)
    }

    impl From<JsValue> for CacheError {
        fn from(value: JsValue) -> Self {
            CacheError::Js(describe_js_value(&value))
        }
    }

    impl From<JsValue> for StorageError {
        fn from(value: JsValue) -> Self {
            StorageError::Unavailable(describe_js_value(&value))
        }
    }
}
