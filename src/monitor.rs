use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use crate::aggregator::{aggregate_wallets, compute_stats};
use crate::cache::WhaleCache;
use crate::classifier::{build_transactions, ExchangeSet, WhaleFilter};
use crate::error::MonitorError;
use crate::fallback;
use crate::models::{DataSource, PriceQuote, TokenTransfer, WhaleDataResponse, WhaleSnapshot};

/// Recent token transfers; empty when the upstream is unavailable
#[async_trait]
pub trait TransferSource: Send + Sync {
    async fn fetch_transfers(&self) -> Vec<TokenTransfer>;
}

/// Current token price; never fails, falls back to a constant
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_price(&self) -> PriceQuote;
}

/// Cache check → fetch → classify/filter → aggregate → cache write
pub struct WhaleMonitor {
    transfers: Arc<dyn TransferSource>,
    prices: Arc<dyn PriceSource>,
    cache: WhaleCache,
    exchanges: ExchangeSet,
    filter: WhaleFilter,
    wallet_limit: usize,
}

impl WhaleMonitor {
    pub fn new(
        transfers: Arc<dyn TransferSource>,
        prices: Arc<dyn PriceSource>,
        cache: WhaleCache,
        exchanges: ExchangeSet,
        threshold: Decimal,
        wallet_limit: usize,
    ) -> Self {
        Self {
            transfers,
            prices,
            cache,
            exchanges,
            filter: WhaleFilter::new(threshold),
            wallet_limit,
        }
    }

    /// Serve from cache while fresh, otherwise recompute and overwrite it
    pub async fn whale_data(&self) -> Result<WhaleDataResponse, MonitorError> {
        if let Some(snapshot) = self.cache.fresh().await {
            return Ok(WhaleDataResponse::from_snapshot(snapshot, DataSource::Cache));
        }

        let (quote, transfers) = tokio::join!(
            self.prices.fetch_price(),
            self.transfers.fetch_transfers()
        );

        let (snapshot, source) = if transfers.is_empty() {
            warn!(price = %quote.usd, "No transfers from explorer, serving synthetic whale data");
            let mut rng = StdRng::from_entropy();
            let snapshot = fallback::generate(&mut rng, quote.usd, self.cache.now())?;
            (snapshot, DataSource::Fallback)
        } else {
            (self.compute(&transfers, quote.usd)?, DataSource::Polygonscan)
        };

        self.cache.store(snapshot.clone()).await;
        Ok(WhaleDataResponse::from_snapshot(snapshot, source))
    }

    fn compute(&self, transfers: &[TokenTransfer], price: Decimal) -> Result<WhaleSnapshot, MonitorError> {
        let transactions = build_transactions(transfers, price, &self.exchanges, &self.filter)?;
        let wallets = aggregate_wallets(&transactions, &self.exchanges, self.wallet_limit)?;
        let stats = compute_stats(&transactions)?;

        info!(
            "Computed {} whale transactions, {} wallets at ${}",
            transactions.len(),
            wallets.len(),
            price
        );

        Ok(WhaleSnapshot {
            transactions,
            wallets,
            stats,
            price,
            fetched_at: self.cache.now(),
        })
    }

    pub async fn price(&self) -> PriceQuote {
        self.prices.fetch_price().await
    }
}
