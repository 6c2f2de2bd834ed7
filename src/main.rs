mod config;
mod handler;
mod logging;
mod metrics;

use anyhow::Result;
use clap::Parser;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::config::ProxyConfig;
use crate::handler::allowlist::AllowedHostSet;
use crate::handler::state::ProxyState;
use crate::handler::upstream;

#[derive(Parser, Debug)]
#[command(version, about)]
pub(crate) struct Args {
    #[arg(long, default_value = "config.toml")]
    config_file: String,

    #[arg(long, default_value = "info")]
    log_level: String,

    #[arg(long, action)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init(&args)?;

    let config = ProxyConfig::load(&args.config_file)?;
    config.validate()?;

    let loopback_address = IpAddr::V4(Ipv4Addr::LOCALHOST);
    let metrics_socket_addr =
        SocketAddr::new(loopback_address, config.metrics_port);
    metrics::init(metrics_socket_addr)?;

    let allowed_hosts = AllowedHostSet::new(&config.allowed_hosts);
    tracing::info!(hosts = %allowed_hosts.listing(), "Loaded allow-list");

    let state = ProxyState {
        allowed_hosts,
        http_client: http_client()?,
        config,
    };

    let proxy_socket_addr =
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), state.config.port);

    let listener = tokio::net::TcpListener::bind(proxy_socket_addr).await?;

    tracing::info!("Starting server on {proxy_socket_addr}...");

    axum::serve(listener, handler::router(state).into_make_service()).await?;

    Ok(())
}

fn http_client() -> Result<reqwest::Client> {
    let http_client = reqwest::Client::builder()
        .timeout(upstream::ATTEMPT_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;
    Ok(http_client)
}
