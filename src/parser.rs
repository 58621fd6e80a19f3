// src/parser.rs
use alloy::primitives::{Address, B256};
use chrono::DateTime;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::explorer::TokenTxRecord;
use crate::models::TokenTransfer;

/// ERC20 default when the explorer omits or garbles `tokenDecimal`
pub const DEFAULT_DECIMALS: u32 = 18;

/// raw ÷ 10^decimals.
///
/// Exact while the raw value fits Decimal's 96-bit mantissa and the scale
/// is at most 28; beyond that it goes through f64. `None` only when the
/// result cannot be represented at all.
pub fn decimal_adjust(raw: u128, decimals: u32) -> Option<Decimal> {
    if let Ok(signed) = i128::try_from(raw) {
        if let Ok(d) = Decimal::try_from_i128_with_scale(signed, decimals) {
            return Some(d.normalize());
        }
    }
    let exp = i32::try_from(decimals).ok()?;
    Decimal::from_f64(raw as f64 / 10f64.powi(exp))
}

fn parse_decimals(field: Option<&str>) -> u32 {
    field
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_DECIMALS)
}

/// Decode a single explorer record into `TokenTransfer`
pub fn decode_transfer(rec: &TokenTxRecord) -> Option<TokenTransfer> {
    let from = rec.from.trim().parse::<Address>().ok()?;
    let to = rec.to.trim().parse::<Address>().ok()?;
    let hash = rec.hash.trim().parse::<B256>().ok()?;

    let raw_value = rec.value.trim().parse::<u128>().ok()?;
    let block_number = rec.block_number.trim().parse::<u64>().ok()?;
    let secs = rec.time_stamp.trim().parse::<i64>().ok()?;
    let timestamp = DateTime::from_timestamp(secs, 0)?;

    Some(TokenTransfer {
        block_number,
        timestamp,
        hash,
        from,
        to,
        raw_value,
        decimals: parse_decimals(rec.token_decimal.as_deref()),
    })
}

/// Decode a page of records, dropping the ones that don't parse
pub fn decode_transfers(records: &[TokenTxRecord]) -> Vec<TokenTransfer> {
    let transfers: Vec<TokenTransfer> = records.iter().filter_map(decode_transfer).collect();
    let dropped = records.len() - transfers.len();
    if dropped > 0 {
        debug!("Dropped {} undecodable transfer records", dropped);
    }
    transfers
}
