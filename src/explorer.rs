// src/explorer.rs
use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::MonitorError;
use crate::models::{to_hex, TokenTransfer};
use crate::monitor::TransferSource;
use crate::parser;

/// One row of the explorer's `tokentx` result, every field a string
#[derive(Debug, Deserialize, Clone)]
pub struct TokenTxRecord {
    #[serde(rename = "blockNumber")]
    pub block_number: String,

    #[serde(rename = "timeStamp")]
    pub time_stamp: String,

    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: String,

    #[serde(rename = "tokenDecimal", default)]
    pub token_decimal: Option<String>,
}

/// `result` is an array on success and an error message otherwise
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenTxResult {
    Records(Vec<TokenTxRecord>),
    Message(String),
}

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    message: String,
    result: TokenTxResult,
}

/// PolygonScan (Etherscan v2) token-transfer client
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    chain_id: u64,
    contract: Address,
    page_size: u32,
}

impl ExplorerClient {
    pub fn new(http: Client, cfg: &Config) -> Self {
        Self {
            http,
            base_url: cfg.explorer_api_url.clone(),
            api_key: cfg.explorer_api_key.clone(),
            chain_id: cfg.chain_id,
            contract: cfg.token_contract,
            page_size: cfg.transfer_page_size,
        }
    }

    /// Latest `page_size` transfers of the token, newest first.
    /// Single attempt.
    pub async fn try_fetch_transfers(&self) -> Result<Vec<TokenTransfer>, MonitorError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| MonitorError::ConfigurationMissing("POLYGONSCAN_API_KEY".into()))?;

        let chain_id = self.chain_id.to_string();
        let contract = to_hex(self.contract.as_slice());
        let offset = self.page_size.to_string();

        info!(
            "Sending tokentx → {} (contract {}, offset {})",
            self.base_url, contract, offset
        );

        let resp = self
            .http
            .get(&self.base_url)
            .query(&[
                ("chainid", chain_id.as_str()),
                ("module", "account"),
                ("action", "tokentx"),
                ("contractaddress", contract.as_str()),
                ("page", "1"),
                ("offset", offset.as_str()),
                ("sort", "desc"),
                ("apikey", api_key),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(MonitorError::UpstreamUnavailable(format!(
                "explorer HTTP {}",
                resp.status()
            )));
        }

        let parsed: ExplorerResponse = resp.json().await?;
        match (parsed.status.as_str(), parsed.result) {
            ("1", TokenTxResult::Records(records)) => Ok(parser::decode_transfers(&records)),
            (status, TokenTxResult::Message(detail)) => Err(MonitorError::UpstreamUnavailable(
                format!("explorer status {}: {} ({})", status, parsed.message, detail),
            )),
            (status, TokenTxResult::Records(_)) => Err(MonitorError::UpstreamUnavailable(
                format!("explorer status {}: {}", status, parsed.message),
            )),
        }
    }
}

#[async_trait]
impl TransferSource for ExplorerClient {
    /// Any failure yields an empty list, which the pipeline reads as
    /// "explorer unavailable".
    async fn fetch_transfers(&self) -> Vec<TokenTransfer> {
        match self.try_fetch_transfers().await {
            Ok(transfers) => {
                info!("Fetched {} token transfers", transfers.len());
                transfers
            }
            Err(e) => {
                warn!(error = %e, "Transfer fetch failed, degrading to fallback");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, routing::get, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::time::Duration;

    const DEFAULT_CONTRACT_LOWER: &str = "0xeb51d9a39ad5eef215dc0bf39a8821ff804a0f01";

    /// Serve `body` on a throwaway port and return its URL
    async fn fake_explorer(body: Value) -> String {
        let app = Router::new().route(
            "/api",
            get(move |Query(q): Query<HashMap<String, String>>| {
                let body = body.clone();
                async move {
                    assert_eq!(q.get("action").map(String::as_str), Some("tokentx"));
                    assert_eq!(q.get("sort").map(String::as_str), Some("desc"));
                    Json(body)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    fn client(url: String, key: Option<&str>) -> ExplorerClient {
        let cfg = Config {
            explorer_api_url: url,
            explorer_api_key: key.map(str::to_string),
            ..Config::default()
        };
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        ExplorerClient::new(http, &cfg)
    }

    #[tokio::test]
    async fn fetches_and_decodes_transfers() {
        let url = fake_explorer(json!({
            "status": "1",
            "message": "OK",
            "result": [{
                "blockNumber": "55000000",
                "timeStamp": "1700000000",
                "hash": format!("0x{}", "cd".repeat(32)),
                "from": "0xa5e0829caced8ffdd4de3c43696c57f7d7a678ff",
                "to": "0x00000000000000000000000000000000000000aa",
                "value": "100000000000000000000000",
                "tokenDecimal": "18",
                "contractAddress": DEFAULT_CONTRACT_LOWER,
            }]
        }))
        .await;

        let got = client(url, Some("key")).fetch_transfers().await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].block_number, 55_000_000);
    }

    #[tokio::test]
    async fn error_status_yields_empty() {
        let url = fake_explorer(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Invalid API Key"
        }))
        .await;

        let c = client(url, Some("bad"));
        assert!(matches!(
            c.try_fetch_transfers().await,
            Err(MonitorError::UpstreamUnavailable(_))
        ));
        assert!(c.fetch_transfers().await.is_empty());
    }

    #[tokio::test]
    async fn missing_key_skips_the_call() {
        // Nothing listens here; the key check must fail first
        let c = client("http://127.0.0.1:9/api".into(), None);
        assert!(matches!(
            c.try_fetch_transfers().await,
            Err(MonitorError::ConfigurationMissing(_))
        ));
        assert!(c.fetch_transfers().await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_explorer_yields_empty() {
        let c = client("http://127.0.0.1:9/api".into(), Some("key"));
        assert!(c.fetch_transfers().await.is_empty());
    }
}
