mod aggregator;
mod api;
mod cache;
mod classifier;
mod config;
mod error;
mod explorer;
mod fallback;
mod models;
mod monitor;
mod parser;
mod price;

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cache::{SystemClock, WhaleCache};
use crate::classifier::ExchangeSet;
use crate::explorer::ExplorerClient;
use crate::monitor::WhaleMonitor;
use crate::price::PriceClient;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // RUST_LOG wins; info otherwise
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();

    info!("LGNS Whale Monitor starting...");

    let cfg = config::load()?;
    info!("  Explorer: {}", cfg.explorer_api_url);
    info!("  Token: {}", cfg.token_contract);
    info!("  Whale threshold: {}", cfg.whale_threshold);
    info!("  Cache TTL: {:?}", cfg.cache_ttl);
    info!("  Exchanges tracked: {}", cfg.exchange_addresses.len());

    // One HTTP client shared by every upstream
    let http = reqwest::Client::builder()
        .timeout(cfg.http_timeout)
        .build()?;

    let monitor = Arc::new(WhaleMonitor::new(
        Arc::new(ExplorerClient::new(http.clone(), &cfg)),
        Arc::new(PriceClient::new(http, &cfg)),
        WhaleCache::new(cfg.cache_ttl, Arc::new(SystemClock)),
        ExchangeSet::new(cfg.exchange_addresses.iter().copied()),
        cfg.whale_threshold,
        cfg.wallet_limit,
    ));

    let api_handle = tokio::spawn({
        let cfg = cfg.clone();
        async move { api::serve(&cfg, monitor).await }
    });

    tokio::select! {
        res = api_handle => match res {
            Ok(Ok(_)) => info!("API exited cleanly"),
            Ok(Err(e)) => error!("API error: {:?}", e),
            Err(e) => error!("API task panicked: {:?}", e),
        },
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, stopping...");
        }
    }

    info!("LGNS Whale Monitor stopped.");
    Ok(())
}
