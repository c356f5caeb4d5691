mod cli;
pub use cli::*;

mod utils;
pub use utils::*;

mod app;
pub use app::*;

pub mod routes;
