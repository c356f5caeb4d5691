use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[clap(name = "exercise log server")]
pub struct Cli {
    /// Directory holding index.html, the manifest, icons and the wasm bundles
    #[clap(long, env, default_value = "assets")]
    pub assets_dir: PathBuf,
    /// Worker script, relative to the assets dir. Served from the root so its
    /// scope covers the whole page
    #[clap(long, env, default_value = "service_worker.js")]
    pub service_worker_path: String,
    #[clap(long, env, default_value = "8080")]
    pub port: u16,
    #[clap(long, env, default_value = "127.0.0.1")]
    pub bind_addr: String,
}
