use alloy::primitives::Address;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::info;

use crate::classifier::ExchangeSet;
use crate::error::MonitorError;
use crate::models::{TxType, WhaleStats, WhaleTransaction, WhaleWallet};

fn add(a: Decimal, b: Decimal) -> Result<Decimal, MonitorError> {
    a.checked_add(b)
        .ok_or_else(|| MonitorError::Internal(format!("amount overflow adding {} + {}", a, b)))
}

fn credit(wallet: &mut WhaleWallet, tx: &WhaleTransaction, inbound: bool) -> Result<(), MonitorError> {
    if inbound {
        wallet.total_in = add(wallet.total_in, tx.amount)?;
    } else {
        wallet.total_out = add(wallet.total_out, tx.amount)?;
    }
    wallet.transaction_count += 1;
    wallet.last_activity = wallet.last_activity.max(tx.timestamp);
    Ok(())
}

/// Fold a batch into per-address flows, keeping every address seen.
///
/// Outbound goes to the sender, inbound to the receiver. `net_flow` is
/// derived from the totals once the fold is done.
pub fn fold_flows(
    txs: &[WhaleTransaction],
) -> Result<HashMap<Address, WhaleWallet>, MonitorError> {
    let mut wallets: HashMap<Address, WhaleWallet> = HashMap::new();

    for tx in txs {
        let sender = wallets
            .entry(tx.from)
            .or_insert_with(|| WhaleWallet::empty(tx.from, tx.timestamp));
        credit(sender, tx, false)?;

        let receiver = wallets
            .entry(tx.to)
            .or_insert_with(|| WhaleWallet::empty(tx.to, tx.timestamp));
        credit(receiver, tx, true)?;
    }

    for wallet in wallets.values_mut() {
        wallet.net_flow = wallet
            .total_in
            .checked_sub(wallet.total_out)
            .ok_or_else(|| MonitorError::Internal("net flow overflow".into()))?;
    }

    Ok(wallets)
}

/// Drop infrastructure addresses, rank by |net flow| and keep the top `limit`
pub fn rank_wallets(
    wallets: HashMap<Address, WhaleWallet>,
    exchanges: &ExchangeSet,
    limit: usize,
) -> Vec<WhaleWallet> {
    let mut ranked: Vec<WhaleWallet> = wallets
        .into_values()
        .filter(|w| !exchanges.contains(&w.address))
        .collect();

    // Address breaks ties so repeated runs agree
    ranked.sort_by(|a, b| {
        b.net_flow
            .abs()
            .cmp(&a.net_flow.abs())
            .then_with(|| a.address.cmp(&b.address))
    });
    ranked.truncate(limit);
    ranked
}

pub fn aggregate_wallets(
    txs: &[WhaleTransaction],
    exchanges: &ExchangeSet,
    limit: usize,
) -> Result<Vec<WhaleWallet>, MonitorError> {
    let flows = fold_flows(txs)?;
    let seen = flows.len();
    let wallets = rank_wallets(flows, exchanges, limit);

    info!(
        "Aggregated {} transactions into {} wallets (kept {})",
        txs.len(),
        seen,
        wallets.len()
    );

    Ok(wallets)
}

pub fn compute_stats(txs: &[WhaleTransaction]) -> Result<WhaleStats, MonitorError> {
    let mut stats = WhaleStats {
        total_transactions: txs.len(),
        ..WhaleStats::default()
    };

    for tx in txs {
        stats.total_volume_usd = add(stats.total_volume_usd, tx.amount_usd)?;
        match tx.tx_type {
            TxType::Buy => {
                stats.buy_count += 1;
                stats.buy_volume_usd = add(stats.buy_volume_usd, tx.amount_usd)?;
            }
            TxType::Sell => {
                stats.sell_count += 1;
                stats.sell_volume_usd = add(stats.sell_volume_usd, tx.amount_usd)?;
            }
            TxType::Transfer => stats.transfer_count += 1,
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::B256;
    use chrono::{DateTime, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn tx(from: u8, to: u8, amount: i64, tx_type: TxType, at: i64) -> WhaleTransaction {
        let from = Address::repeat_byte(from);
        let to = Address::repeat_byte(to);
        let hash = B256::repeat_byte(at as u8);
        WhaleTransaction {
            id: WhaleTransaction::make_id(&hash, &from, &to),
            hash,
            tx_type,
            amount: Decimal::from(amount),
            amount_usd: Decimal::from(amount * 2),
            from,
            to,
            timestamp: ts(at),
            block_number: at as u64,
        }
    }

    fn batch() -> Vec<WhaleTransaction> {
        vec![
            tx(0xee, 0x01, 100_000, TxType::Buy, 10),
            tx(0x01, 0x02, 60_000, TxType::Transfer, 20),
            tx(0x02, 0xee, 55_000, TxType::Sell, 15),
            tx(0x03, 0x01, 70_000, TxType::Transfer, 5),
        ]
    }

    #[test]
    fn folds_in_and_out_per_address() {
        let flows = fold_flows(&batch()).unwrap();
        let w1 = &flows[&Address::repeat_byte(0x01)];

        assert_eq!(w1.total_in, Decimal::from(170_000));
        assert_eq!(w1.total_out, Decimal::from(60_000));
        assert_eq!(w1.net_flow, Decimal::from(110_000));
        assert_eq!(w1.transaction_count, 3);
        assert_eq!(w1.last_activity, ts(20));
    }

    #[test]
    fn flows_form_a_closed_system() {
        let txs = batch();
        let flows = fold_flows(&txs).unwrap();

        let total: Decimal = txs.iter().map(|t| t.amount).sum();
        let total_in: Decimal = flows.values().map(|w| w.total_in).sum();
        let total_out: Decimal = flows.values().map(|w| w.total_out).sum();

        assert_eq!(total_in, total);
        assert_eq!(total_out, total);
        for w in flows.values() {
            assert_eq!(w.net_flow, w.total_in - w.total_out);
        }
    }

    #[test]
    fn aggregation_is_idempotent() {
        let ex = ExchangeSet::new([Address::repeat_byte(0xee)]);
        let txs = batch();
        assert_eq!(
            aggregate_wallets(&txs, &ex, 20).unwrap(),
            aggregate_wallets(&txs, &ex, 20).unwrap()
        );
    }

    #[test]
    fn excludes_exchanges_and_ranks_by_abs_net_flow() {
        let ex = ExchangeSet::new([Address::repeat_byte(0xee)]);
        let wallets = aggregate_wallets(&batch(), &ex, 20).unwrap();

        assert!(wallets.iter().all(|w| w.address != Address::repeat_byte(0xee)));
        let order: Vec<Address> = wallets.iter().map(|w| w.address).collect();
        // 0x01 +110k, 0x03 -70k, 0x02 +5k
        assert_eq!(
            order,
            vec![
                Address::repeat_byte(0x01),
                Address::repeat_byte(0x03),
                Address::repeat_byte(0x02),
            ]
        );
    }

    #[test]
    fn truncates_to_limit() {
        let txs: Vec<WhaleTransaction> = (1..=30u8)
            .map(|i| tx(0xee, i, 50_000 + i64::from(i), TxType::Buy, i64::from(i)))
            .collect();
        let ex = ExchangeSet::new([Address::repeat_byte(0xee)]);
        let wallets = aggregate_wallets(&txs, &ex, 20).unwrap();

        assert_eq!(wallets.len(), 20);
        assert_eq!(wallets[0].address, Address::repeat_byte(30));
    }

    #[test]
    fn stats_split_by_type() {
        let stats = compute_stats(&batch()).unwrap();
        assert_eq!(stats.total_transactions, 4);
        assert_eq!(stats.buy_count, 1);
        assert_eq!(stats.sell_count, 1);
        assert_eq!(stats.transfer_count, 2);
        assert_eq!(stats.total_volume_usd, Decimal::from(570_000));
        assert_eq!(stats.buy_volume_usd, Decimal::from(200_000));
        assert_eq!(stats.sell_volume_usd, Decimal::from(110_000));
    }
}
