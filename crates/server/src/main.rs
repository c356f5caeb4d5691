use std::{
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

use clap::Parser;
use server::{app, load_dotenv, Cli};
use shared::utils::tracing::configure_tracing;
use tokio::net::TcpListener;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    load_dotenv()?;
    configure_tracing();

    let args = Cli::parse();
    debug!(?args);

    let socket = SocketAddr::new(IpAddr::from_str(&args.bind_addr)?, args.port);

    let listener = TcpListener::bind(socket).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app(&args)).await?;

    Ok(())
}
