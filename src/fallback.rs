//! Synthetic whale data for when the explorer gives us nothing.
//!
//! The payload is tagged `"fallback"` by the caller; values here only need
//! to look plausible.

use alloy::primitives::{Address, B256};
use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use rust_decimal::Decimal;

use crate::aggregator::compute_stats;
use crate::error::MonitorError;
use crate::models::{TxType, WhaleSnapshot, WhaleTransaction, WhaleWallet};

pub const FALLBACK_TRANSACTIONS: usize = 20;
pub const FALLBACK_WALLETS: usize = 10;

const WINDOW_SECS: i64 = 7 * 24 * 60 * 60;
// Roughly the Polygon PoS head; blocks are ~2s apart
const HEAD_BLOCK: u64 = 65_000_000;
const BLOCK_SECS: i64 = 2;

/// Whole cents in [min, max) tokens
fn amount_between<R: Rng>(rng: &mut R, min: u64, max: u64) -> Decimal {
    let cents = rng.gen_range(min * 100..max * 100);
    Decimal::new(cents as i64, 2)
}

fn recent<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> (DateTime<Utc>, i64) {
    let age = rng.gen_range(0..WINDOW_SECS);
    (now - TimeDelta::seconds(age), age)
}

fn synthetic_transaction<R: Rng>(
    rng: &mut R,
    price: Decimal,
    now: DateTime<Utc>,
) -> Result<WhaleTransaction, MonitorError> {
    let hash = B256::from(rng.gen::<[u8; 32]>());
    let from = Address::from(rng.gen::<[u8; 20]>());
    let to = Address::from(rng.gen::<[u8; 20]>());
    let amount = amount_between(rng, 50_000, 500_000);
    let (timestamp, age) = recent(rng, now);

    let tx_type = match rng.gen_range(0..3) {
        0 => TxType::Buy,
        1 => TxType::Sell,
        _ => TxType::Transfer,
    };

    Ok(WhaleTransaction {
        id: WhaleTransaction::make_id(&hash, &from, &to),
        hash,
        tx_type,
        amount,
        amount_usd: amount
            .checked_mul(price)
            .ok_or_else(|| MonitorError::Internal("fallback USD overflow".into()))?,
        from,
        to,
        timestamp,
        block_number: HEAD_BLOCK.saturating_sub((age / BLOCK_SECS) as u64),
    })
}

fn synthetic_wallet<R: Rng>(rng: &mut R, now: DateTime<Utc>) -> WhaleWallet {
    let total_in = amount_between(rng, 0, 1_000_000);
    let total_out = amount_between(rng, 0, 1_000_000);
    WhaleWallet {
        address: Address::from(rng.gen::<[u8; 20]>()),
        total_in,
        total_out,
        net_flow: total_in - total_out,
        transaction_count: rng.gen_range(1..50),
        last_activity: recent(rng, now).0,
    }
}

/// 20 random transactions and 10 random wallets, priced at `price`.
///
/// Wallets are generated independently of the transactions.
pub fn generate<R: Rng>(
    rng: &mut R,
    price: Decimal,
    now: DateTime<Utc>,
) -> Result<WhaleSnapshot, MonitorError> {
    let mut transactions = (0..FALLBACK_TRANSACTIONS)
        .map(|_| synthetic_transaction(rng, price, now))
        .collect::<Result<Vec<_>, _>>()?;
    transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut wallets: Vec<WhaleWallet> = (0..FALLBACK_WALLETS)
        .map(|_| synthetic_wallet(rng, now))
        .collect();
    wallets.sort_by(|a, b| b.net_flow.abs().cmp(&a.net_flow.abs()));

    let stats = compute_stats(&transactions)?;

    Ok(WhaleSnapshot {
        transactions,
        wallets,
        stats,
        price,
        fetched_at: now,
    })
}
