// src/models.rs
use alloy::primitives::{Address, B256};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// A decoded ERC20 transfer of the tracked token, as reported by the explorer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
    pub hash: B256,
    pub from: Address,
    pub to: Address,
    pub raw_value: u128, // raw token units, scaled by `decimals`
    pub decimals: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Buy,
    Sell,
    Transfer,
}

/// A transfer that cleared the whale threshold, priced at the batch price
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhaleTransaction {
    pub id: String,
    #[serde(serialize_with = "ser_hash")]
    pub hash: B256,
    #[serde(rename = "type")]
    pub tx_type: TxType,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "amountUSD", with = "rust_decimal::serde::float")]
    pub amount_usd: Decimal,
    #[serde(serialize_with = "ser_address")]
    pub from: Address,
    #[serde(serialize_with = "ser_address")]
    pub to: Address,
    pub timestamp: DateTime<Utc>,
    pub block_number: u64,
}

impl WhaleTransaction {
    /// `hash-from-to`, unique per transfer within a batch
    pub fn make_id(hash: &B256, from: &Address, to: &Address) -> String {
        format!(
            "{}-{}-{}",
            to_hex(hash.as_slice()),
            to_hex(from.as_slice()),
            to_hex(to.as_slice())
        )
    }
}

/// Net flow of one address across a batch of whale transactions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhaleWallet {
    #[serde(serialize_with = "ser_address")]
    pub address: Address,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_in: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_out: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_flow: Decimal,
    pub transaction_count: u32,
    pub last_activity: DateTime<Utc>,
}

impl WhaleWallet {
    pub fn empty(address: Address, seen_at: DateTime<Utc>) -> Self {
        Self {
            address,
            total_in: Decimal::ZERO,
            total_out: Decimal::ZERO,
            net_flow: Decimal::ZERO,
            transaction_count: 0,
            last_activity: seen_at,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhaleStats {
    pub total_transactions: usize,
    pub buy_count: usize,
    pub sell_count: usize,
    pub transfer_count: usize,
    #[serde(rename = "totalVolumeUSD", with = "rust_decimal::serde::float")]
    pub total_volume_usd: Decimal,
    #[serde(rename = "buyVolumeUSD", with = "rust_decimal::serde::float")]
    pub buy_volume_usd: Decimal,
    #[serde(rename = "sellVolumeUSD", with = "rust_decimal::serde::float")]
    pub sell_volume_usd: Decimal,
}

/// Result of one fetch-and-compute cycle; replaced wholesale on refresh
#[derive(Debug, Clone, PartialEq)]
pub struct WhaleSnapshot {
    pub transactions: Vec<WhaleTransaction>,
    pub wallets: Vec<WhaleWallet>,
    pub stats: WhaleStats,
    pub price: Decimal,
    pub fetched_at: DateTime<Utc>,
}

/// Where a `/whale-data` payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Cache,
    Polygonscan,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhaleDataResponse {
    pub success: bool,
    pub source: DataSource,
    #[serde(with = "rust_decimal::serde::float")]
    pub lgns_price: Decimal,
    pub transactions: Vec<WhaleTransaction>,
    pub wallets: Vec<WhaleWallet>,
    pub stats: WhaleStats,
}

impl WhaleDataResponse {
    pub fn from_snapshot(snapshot: WhaleSnapshot, source: DataSource) -> Self {
        Self {
            success: true,
            source,
            lgns_price: snapshot.price,
            transactions: snapshot.transactions,
            wallets: snapshot.wallets,
            stats: snapshot.stats,
        }
    }
}

/// Which market-data API produced a price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceOrigin {
    Dexscreener,
    Geckoterminal,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceQuote {
    #[serde(rename = "price", with = "rust_decimal::serde::float")]
    pub usd: Decimal,
    pub source: PriceOrigin,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub success: bool,
    #[serde(flatten)]
    pub quote: PriceQuote,
}

/// Lowercase `0x`-prefixed hex, the form the explorer returns
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn ser_address<S: Serializer>(addr: &Address, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&to_hex(addr.as_slice()))
}

fn ser_hash<S: Serializer>(hash: &B256, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&to_hex(hash.as_slice()))
}
