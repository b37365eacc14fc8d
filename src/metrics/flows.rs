use ethers::types::U256;
use std::collections::BTreeMap;
use crate::models::{Address, Transaction, TxKind};

/// Label for token transfers that carry no symbol
pub const UNKNOWN_TOKEN: &str = "UNKNOWN";

/// Exact native-value totals for one address
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowTotals {
    pub sent_wei: U256,
    pub received_wei: U256,
}

/// Sum native value sent by and received by `address`.
///
/// Token transfers are excluded since their values are token base units.
/// A self-transfer counts on both sides.
pub fn totals_by_side(transactions: &[Transaction], address: &Address) -> FlowTotals {
    transactions
        .iter()
        .filter(|tx| tx.kind.is_native())
        .fold(FlowTotals::default(), |mut totals, tx| {
            if &tx.from == address {
                totals.sent_wei = totals.sent_wei.saturating_add(tx.value_wei);
            }
            if &tx.to == address {
                totals.received_wei = totals.received_wei.saturating_add(tx.value_wei);
            }
            totals
        })
}

/// Integer mean gas price in wei over transactions that report one
pub fn average_gas_price(transactions: &[Transaction]) -> U256 {
    let (sum, count) = transactions
        .iter()
        .filter(|tx| !tx.gas_price.is_zero())
        .fold((U256::zero(), 0u64), |(sum, count), tx| {
            (sum.saturating_add(tx.gas_price), count + 1)
        });

    if count == 0 {
        U256::zero()
    } else {
        sum / U256::from(count)
    }
}

pub fn token_transfer_counts(transactions: &[Transaction]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for tx in transactions.iter().filter(|tx| tx.kind == TxKind::TokenTransfer) {
        let symbol = tx
            .token_symbol
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_TOKEN);
        *counts.entry(symbol.to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Chain;
    use crate::models::WEI_PER_GWEI;

    fn addr(n: u8) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    fn tx(from: u8, to: u8, wei: u64, kind: TxKind) -> Transaction {
        Transaction::new(format!("0x{}{}", from, to), addr(from), addr(to), U256::from(wei), Chain::Ethereum, kind)
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(totals_by_side(&[], &addr(1)), FlowTotals::default());
        assert_eq!(average_gas_price(&[]), U256::zero());
        assert!(token_transfer_counts(&[]).is_empty());
    }

    #[test]
    fn test_totals_exclude_tokens() {
        let txs = vec![
            tx(1, 2, 100, TxKind::Regular),
            tx(2, 1, 40, TxKind::Internal),
            tx(1, 3, 7, TxKind::TokenTransfer),
            tx(4, 5, 999, TxKind::Regular),
        ];
        let totals = totals_by_side(&txs, &addr(1));
        assert_eq!(totals.sent_wei, U256::from(100));
        assert_eq!(totals.received_wei, U256::from(40));
    }

    #[test]
    fn test_totals_exact_beyond_f64() {
        let big = U256::from_dec_str("123456789012345678901234567891").unwrap();
        let mut a = tx(2, 1, 0, TxKind::Regular);
        a.value_wei = big;
        let mut b = tx(3, 1, 0, TxKind::Regular);
        b.value_wei = U256::one();

        let totals = totals_by_side(&[a, b], &addr(1));
        assert_eq!(totals.received_wei, big + U256::one());
    }

    #[test]
    fn test_average_gas_skips_zero() {
        let txs = vec![
            tx(1, 2, 0, TxKind::Regular).with_gas_price(U256::from(10 * WEI_PER_GWEI)),
            tx(1, 2, 0, TxKind::Regular).with_gas_price(U256::from(30 * WEI_PER_GWEI)),
            tx(2, 1, 0, TxKind::Internal),
        ];
        assert_eq!(average_gas_price(&txs), U256::from(20 * WEI_PER_GWEI));
    }

    #[test]
    fn test_token_counts_default_symbol() {
        let txs = vec![
            tx(1, 2, 1, TxKind::TokenTransfer).with_token_symbol("USDC"),
            tx(1, 2, 1, TxKind::TokenTransfer).with_token_symbol("USDC"),
            tx(1, 2, 1, TxKind::TokenTransfer),
            tx(1, 2, 1, TxKind::Regular),
        ];
        let counts = token_transfer_counts(&txs);
        assert_eq!(counts.get("USDC"), Some(&2));
        assert_eq!(counts.get(UNKNOWN_TOKEN), Some(&1));
        assert_eq!(counts.len(), 2);
    }
}
