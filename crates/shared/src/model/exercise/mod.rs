mod record;
pub use record::*;

mod form;
pub use form::*;
