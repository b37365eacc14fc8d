//! Heuristic scores
//!
//! Every score is an independent pure function clamped to [0, 100]. Value
//! based scores look at native transfers only; amounts are converted to whole
//! units just before scaling.

use ethers::types::U256;
use std::collections::HashSet;
use crate::config::ScoringConfig;
use crate::models::{
    transaction::{units_to_wei, wei_to_units},
    Address, OpportunityScores, RiskScores, Transaction, TxKind, TrustScores, VolatilityScores,
};

pub(crate) fn clamp_score(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn native(transactions: &[Transaction]) -> impl Iterator<Item = &Transaction> {
    transactions.iter().filter(|tx| tx.kind.is_native())
}

fn units_sum<'a>(transactions: impl Iterator<Item = &'a Transaction>) -> f64 {
    wei_to_units(
        transactions.fold(U256::zero(), |sum, tx| sum.saturating_add(tx.value_wei)),
    )
}

/// Transactions with `0 < value < threshold`
pub fn count_dust(transactions: &[Transaction], threshold_units: f64) -> usize {
    let threshold = units_to_wei(threshold_units);
    native(transactions)
        .filter(|tx| !tx.value_wei.is_zero() && tx.value_wei < threshold)
        .count()
}

pub fn count_high_value(transactions: &[Transaction], threshold_units: f64) -> usize {
    let threshold = units_to_wei(threshold_units);
    native(transactions).filter(|tx| tx.value_wei > threshold).count()
}

pub fn activity_score(transactions: &[Transaction], cfg: &ScoringConfig) -> f64 {
    if transactions.is_empty() {
        return 0.0;
    }
    let value = units_sum(native(transactions));
    clamp_score(transactions.len() as f64 + value / cfg.activity_value_divisor)
}

pub fn risk_scores(transactions: &[Transaction], address: &Address, cfg: &ScoringConfig) -> RiskScores {
    let outflow = units_sum(native(transactions).filter(|tx| &tx.from == address));
    let failed = transactions.iter().filter(|tx| tx.is_error).count();

    RiskScores {
        targeted_attacks: clamp_score(
            count_high_value(transactions, cfg.high_value_threshold) as f64 * cfg.targeted_attack_weight,
        ),
        dusting: clamp_score(count_dust(transactions, cfg.dust_threshold) as f64 * cfg.dusting_weight),
        draining: clamp_score(outflow / cfg.draining_divisor),
        phishing: clamp_score(failed as f64 * cfg.phishing_weight),
    }
}

pub fn opportunity_scores(transactions: &[Transaction], address: &Address, cfg: &ScoringConfig) -> OpportunityScores {
    let incoming = units_sum(native(transactions).filter(|tx| &tx.to == address));
    let recipients: HashSet<&Address> = transactions.iter().map(|tx| &tx.to).collect();
    let regular = transactions.iter().filter(|tx| tx.kind == TxKind::Regular).count();

    OpportunityScores {
        investment: clamp_score(incoming / cfg.investment_divisor),
        staking: clamp_score(recipients.len() as f64 * cfg.staking_weight),
        tax_efficiency: clamp_score(regular as f64 * cfg.tax_efficiency_weight),
    }
}

pub fn trust_scores(transactions: &[Transaction], address: &Address, cfg: &ScoringConfig) -> TrustScores {
    let sources: HashSet<&Address> = transactions
        .iter()
        .filter(|tx| &tx.to == address)
        .map(|tx| &tx.from)
        .collect();
    let recipients: HashSet<&Address> = transactions
        .iter()
        .filter(|tx| &tx.from == address)
        .map(|tx| &tx.to)
        .collect();

    TrustScores {
        trusted_sources: clamp_score(sources.len() as f64 * cfg.trust_weight),
        trusted_recipients: clamp_score(recipients.len() as f64 * cfg.trust_weight),
        wallet_trust: clamp_score(transactions.len() as f64 / cfg.wallet_trust_divisor * cfg.trust_weight),
    }
}

pub fn volatility_scores(transactions: &[Transaction]) -> VolatilityScores {
    let values: Vec<U256> = native(transactions).map(|tx| tx.value_wei).collect();

    let by_coin = match (values.iter().max(), values.iter().min()) {
        (Some(max), Some(min)) if !max.is_zero() => {
            clamp_score(wei_to_units(*max - *min) / wei_to_units(*max) * 100.0)
        }
        _ => 0.0,
    };

    let value_sum = units_sum(native(transactions));
    let by_wallet = if value_sum > 0.0 {
        clamp_score(values.len() as f64 / value_sum * 100.0)
    } else {
        0.0
    };

    VolatilityScores { by_coin, by_wallet }
}
