mod record_id;
pub use record_id::*;
