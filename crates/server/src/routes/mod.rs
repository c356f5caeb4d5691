mod version;
pub use version::*;
