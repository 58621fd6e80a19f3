use alloy::primitives::Address;
use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::debug;

use crate::error::MonitorError;
use crate::models::{TokenTransfer, TxType, WhaleTransaction};
use crate::parser::decimal_adjust;

/// Known exchange, router and burn addresses.
///
/// Addresses are parsed into 20-byte values, so hex case never matters.
#[derive(Debug, Clone, Default)]
pub struct ExchangeSet {
    addresses: HashSet<Address>,
}

impl ExchangeSet {
    pub fn new(addresses: impl IntoIterator<Item = Address>) -> Self {
        Self {
            addresses: addresses.into_iter().collect(),
        }
    }

    pub fn contains(&self, addr: &Address) -> bool {
        self.addresses.contains(addr)
    }
}

/// buy: tokens leave an exchange for a non-exchange.
/// sell: tokens enter an exchange from a non-exchange.
/// Everything else is a plain transfer.
pub fn classify(from: &Address, to: &Address, exchanges: &ExchangeSet) -> TxType {
    match (exchanges.contains(from), exchanges.contains(to)) {
        (true, false) => TxType::Buy,
        (false, true) => TxType::Sell,
        _ => TxType::Transfer,
    }
}

/// Admits transfers whose decimal-adjusted amount reaches the threshold
#[derive(Debug, Clone, Copy)]
pub struct WhaleFilter {
    threshold: Decimal,
}

impl WhaleFilter {
    pub fn new(threshold: Decimal) -> Self {
        Self { threshold }
    }

    /// Adjusted amount when `t` is a whale transfer
    pub fn admit(&self, t: &TokenTransfer) -> Option<Decimal> {
        decimal_adjust(t.raw_value, t.decimals).filter(|amount| *amount >= self.threshold)
    }
}

/// Filter, classify and price one batch. Every transaction is valued at the
/// same `price`.
pub fn build_transactions(
    transfers: &[TokenTransfer],
    price: Decimal,
    exchanges: &ExchangeSet,
    filter: &WhaleFilter,
) -> Result<Vec<WhaleTransaction>, MonitorError> {
    let mut out = Vec::new();

    for t in transfers {
        let Some(amount) = filter.admit(t) else {
            continue;
        };

        let amount_usd = amount.checked_mul(price).ok_or_else(|| {
            MonitorError::Internal(format!("USD value overflow for {} × {}", amount, price))
        })?;

        out.push(WhaleTransaction {
            id: WhaleTransaction::make_id(&t.hash, &t.from, &t.to),
            hash: t.hash,
            tx_type: classify(&t.from, &t.to, exchanges),
            amount,
            amount_usd,
            from: t.from,
            to: t.to,
            timestamp: t.timestamp,
            block_number: t.block_number,
        });
    }

    debug!(
        "{} of {} transfers cleared the whale threshold",
        out.len(),
        transfers.len()
    );

    Ok(out)
}
