//! Core of the exercise log: the record store and its durable slot, the view
//! query engine, the page session, and the offline cache protocol run by the
//! service worker.

pub mod cache;
pub mod error;
pub mod model;
pub mod query;
pub mod session;
pub mod store;
pub mod types;
pub mod utils;

pub use session::ExerciseLog;
