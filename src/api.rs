use axum::{extract::State, response::Json, routing::get, Router};
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::config::Config;
use crate::error::MonitorError;
use crate::models::{PriceResponse, WhaleDataResponse};
use crate::monitor::WhaleMonitor;

pub fn router(monitor: Arc<WhaleMonitor>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "LGNS Whale Monitor API running" }))
        .route("/whale-data", get(whale_data))
        .route("/lgns-price", get(lgns_price))
        .layer(cors)
        .with_state(monitor)
}

pub async fn serve(cfg: &Config, monitor: Arc<WhaleMonitor>) -> eyre::Result<()> {
    let app = router(monitor);

    let addr = SocketAddr::new(cfg.bind_addr, cfg.port);
    info!("API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

async fn whale_data(
    State(monitor): State<Arc<WhaleMonitor>>,
) -> Result<Json<WhaleDataResponse>, MonitorError> {
    let resp = monitor.whale_data().await.map_err(|e| {
        error!(error = %e, "whale-data failed");
        e
    })?;
    info!(
        source = ?resp.source,
        transactions = resp.transactions.len(),
        wallets = resp.wallets.len(),
        "whale-data served"
    );
    Ok(Json(resp))
}

async fn lgns_price(State(monitor): State<Arc<WhaleMonitor>>) -> Json<PriceResponse> {
    Json(PriceResponse {
        success: true,
        quote: monitor.price().await,
    })
}
