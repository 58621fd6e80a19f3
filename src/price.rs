use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::MonitorError;
use crate::models::{to_hex, PriceOrigin, PriceQuote};
use crate::monitor::PriceSource;

#[derive(Debug, Deserialize)]
struct DexScreenerResponse {
    #[serde(default)]
    pairs: Option<Vec<DexPair>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DexPair {
    price_usd: Option<String>,
    #[serde(default)]
    liquidity: Option<DexLiquidity>,
}

#[derive(Debug, Deserialize)]
struct DexLiquidity {
    usd: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct GeckoResponse {
    data: GeckoData,
}

#[derive(Debug, Deserialize)]
struct GeckoData {
    attributes: GeckoAttributes,
}

#[derive(Debug, Deserialize)]
struct GeckoAttributes {
    price_usd: Option<String>,
}

fn parse_price(raw: Option<&str>, api: &str) -> Result<Decimal, MonitorError> {
    let raw = raw.ok_or_else(|| MonitorError::UpstreamUnavailable(format!("{}: no price", api)))?;
    let price = Decimal::from_str(raw.trim())
        .or_else(|_| Decimal::from_scientific(raw.trim()))
        .map_err(|e| MonitorError::UpstreamUnavailable(format!("{}: bad price {:?}: {}", api, raw, e)))?;
    if price <= Decimal::ZERO {
        return Err(MonitorError::UpstreamUnavailable(format!(
            "{}: non-positive price {}",
            api, price
        )));
    }
    Ok(price)
}

/// LGNS/USD from DexScreener, then GeckoTerminal, then a fixed constant
#[derive(Debug, Clone)]
pub struct PriceClient {
    http: Client,
    dexscreener_url: String,
    geckoterminal_url: String,
    contract: Address,
    fallback: Decimal,
}

impl PriceClient {
    pub fn new(http: Client, cfg: &Config) -> Self {
        Self {
            http,
            dexscreener_url: cfg.dexscreener_api_url.trim_end_matches('/').to_string(),
            geckoterminal_url: cfg.geckoterminal_api_url.trim_end_matches('/').to_string(),
            contract: cfg.token_contract,
            fallback: cfg.fallback_price,
        }
    }

    /// Price of the deepest pair
    pub async fn try_dexscreener(&self) -> Result<Decimal, MonitorError> {
        let url = format!("{}/{}", self.dexscreener_url, to_hex(self.contract.as_slice()));
        let resp = self.http.get(&url).send().await?.error_for_status()?;
        let body: DexScreenerResponse = resp.json().await?;

        let best = body
            .pairs
            .unwrap_or_default()
            .into_iter()
            .filter(|p| p.price_usd.is_some())
            .max_by(|a, b| {
                let la = a.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0);
                let lb = b.liquidity.as_ref().and_then(|l| l.usd).unwrap_or(0.0);
                la.total_cmp(&lb)
            })
            .ok_or_else(|| MonitorError::UpstreamUnavailable("dexscreener: no pairs".into()))?;

        parse_price(best.price_usd.as_deref(), "dexscreener")
    }

    pub async fn try_geckoterminal(&self) -> Result<Decimal, MonitorError> {
        let url = format!("{}/{}", self.geckoterminal_url, to_hex(self.contract.as_slice()));
        let resp = self.http.get(&url).send().await?.error_for_status()?;
        let body: GeckoResponse = resp.json().await?;
        parse_price(body.data.attributes.price_usd.as_deref(), "geckoterminal")
    }
}

#[async_trait]
impl PriceSource for PriceClient {
    async fn fetch_price(&self) -> PriceQuote {
        match self.try_dexscreener().await {
            Ok(usd) => {
                debug!("LGNS price {} (dexscreener)", usd);
                return PriceQuote { usd, source: PriceOrigin::Dexscreener };
            }
            Err(e) => warn!(error = %e, "DexScreener price failed"),
        }

        match self.try_geckoterminal().await {
            Ok(usd) => {
                debug!("LGNS price {} (geckoterminal)", usd);
                PriceQuote { usd, source: PriceOrigin::Geckoterminal }
            }
            Err(e) => {
                warn!(error = %e, fallback = %self.fallback, "GeckoTerminal price failed, using fallback");
                PriceQuote {
                    usd: self.fallback,
                    source: PriceOrigin::Fallback,
                }
            }
        }
    }
}
