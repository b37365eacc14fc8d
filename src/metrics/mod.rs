//! Metrics & scoring over a transaction set
//!
//! Each function here is pure and independent of the others; `compute_metrics`
//! only assembles them.

pub mod capital_gains;
pub mod flows;
pub mod scores;
pub mod summary;

pub use capital_gains::{estimate_capital_gains, FifoLedger, LotMatch};
pub use flows::{average_gas_price, token_transfer_counts, totals_by_side, FlowTotals, UNKNOWN_TOKEN};
pub use scores::{
    activity_score, count_dust, count_high_value, opportunity_scores, risk_scores, trust_scores,
    volatility_scores,
};
pub use summary::{counterparty_counts, financial_summary, fraud_risk_summary};

use crate::config::ScoringConfig;
use crate::models::{
    transaction::{wei_to_gwei, wei_to_units},
    Address, MetricsBundle, Transaction,
};

pub fn compute_metrics(address: &Address, transactions: &[Transaction], cfg: &ScoringConfig) -> MetricsBundle {
    let totals = totals_by_side(transactions, address);

    MetricsBundle {
        address: address.clone(),
        transaction_count: transactions.len(),
        eth_sent_wei: totals.sent_wei,
        eth_received_wei: totals.received_wei,
        eth_sent: wei_to_units(totals.sent_wei),
        eth_received: wei_to_units(totals.received_wei),
        avg_gas_price_gwei: wei_to_gwei(average_gas_price(transactions)),
        token_transfer_counts: token_transfer_counts(transactions),
        activity_score: activity_score(transactions, cfg),
        risk_scores: risk_scores(transactions, address, cfg),
        opportunity_scores: opportunity_scores(transactions, address, cfg),
        trust_scores: trust_scores(transactions, address, cfg),
        volatility_scores: volatility_scores(transactions),
        capital_gains: estimate_capital_gains(transactions, address, cfg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Chain;
    use crate::models::{transaction::units_to_wei, TxKind};

    #[test]
    fn test_bundle_consistent_with_inputs() {
        let me = Address::parse("0x00000000000000000000000000000000000000aa").unwrap();
        let other = Address::parse("0x00000000000000000000000000000000000000bb").unwrap();
        let txs = vec![
            Transaction::new("0x1", other.clone(), me.clone(), units_to_wei(2.0), Chain::Ethereum, TxKind::Regular),
            Transaction::new("0x2", me.clone(), other.clone(), units_to_wei(0.5), Chain::Ethereum, TxKind::Regular),
        ];

        let bundle = compute_metrics(&me, &txs, &ScoringConfig::default());
        assert_eq!(bundle.transaction_count, 2);
        assert_eq!(bundle.eth_received, 2.0);
        assert_eq!(bundle.eth_sent, 0.5);
        assert_eq!(bundle.avg_gas_price_gwei, 0.0);

        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json.get("ethSent").is_some());
        assert!(json["riskScores"].get("targetedAttacks").is_some());
    }
}
