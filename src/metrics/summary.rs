use std::collections::{BTreeMap, HashMap};
use crate::blockchain::Layer;
use crate::config::ScoringConfig;
use crate::dataset::Dataset;
use crate::models::{ActiveCounterparty, Address, FinancialSummary, FraudRiskSummary, Transaction};

/// Interaction counts per counterparty of `address`
pub fn counterparty_counts(transactions: &[Transaction], address: &Address) -> HashMap<Address, usize> {
    let mut counts = HashMap::new();
    for tx in transactions {
        if let Some(other) = tx.counterparty(address) {
            if other != address {
                *counts.entry(other.clone()).or_insert(0) += 1;
            }
        }
    }
    counts
}

/// Bucket counterparties: flagged when the dataset names them, otherwise by
/// how often the wallet interacts with them
pub fn fraud_risk_summary(
    counts: &HashMap<Address, usize>,
    dataset: &Dataset,
    cfg: &ScoringConfig,
) -> FraudRiskSummary {
    let mut summary = FraudRiskSummary::default();
    for (counterparty, &count) in counts {
        if dataset.is_flagged(counterparty) {
            summary.flagged += 1;
        } else if count > cfg.fraud_low_min_interactions {
            summary.low += 1;
        } else if count > cfg.fraud_moderate_min_interactions {
            summary.moderate += 1;
        } else {
            summary.high += 1;
        }
    }
    summary
}

pub fn financial_summary(
    address: &Address,
    transactions: &[Transaction],
    dataset: &Dataset,
    cfg: &ScoringConfig,
) -> FinancialSummary {
    let mut by_chain: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_layer: BTreeMap<String, usize> = BTreeMap::new();
    for tx in transactions {
        *by_chain.entry(tx.chain.name().to_string()).or_insert(0) += 1;
        let layer = match tx.chain.layer() {
            Layer::L1 => "L1",
            Layer::L2 => "L2",
        };
        *by_layer.entry(layer.to_string()).or_insert(0) += 1;
    }

    let counts = counterparty_counts(transactions, address);
    let most_active_wallet = counts
        .iter()
        .max_by(|(a_addr, a_count), (b_addr, b_count)| {
            a_count.cmp(b_count).then_with(|| b_addr.cmp(a_addr))
        })
        .map(|(address, &count)| ActiveCounterparty {
            address: address.clone(),
            transaction_count: count,
        });

    FinancialSummary {
        total_transactions: transactions.len(),
        transactions_by_chain: by_chain,
        transactions_by_layer: by_layer,
        interacting_wallets: counts.len(),
        interacting_wallet_transactions: counts.values().sum(),
        most_active_wallet,
        fraud_risk_summary: fraud_risk_summary(&counts, dataset, cfg),
    }
}
