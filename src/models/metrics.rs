use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use super::address::Address;
use super::transaction::decimal_u256;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScores {
    pub targeted_attacks: f64,
    pub dusting: f64,
    pub draining: f64,
    pub phishing: f64,
}

impl RiskScores {
    pub fn max(&self) -> f64 {
        [self.targeted_attacks, self.dusting, self.draining, self.phishing]
            .into_iter()
            .fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityScores {
    pub investment: f64,
    pub staking: f64,
    pub tax_efficiency: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustScores {
    pub trusted_sources: f64,
    pub trusted_recipients: f64,
    pub wallet_trust: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolatilityScores {
    pub by_coin: f64,
    pub by_wallet: f64,
}

/// Purchase lot still open after FIFO matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenLot {
    #[serde(with = "decimal_u256")]
    pub amount_wei: U256,
    pub price: f64,
}

/// Realized gain estimate under fixed assumed prices. Not a market valuation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalGainsEstimate {
    pub realized_gain: f64,
    pub estimated_tax: f64,
    pub open_lots: Vec<OpenLot>,
    /// Outgoing amount that found no open lot to match against
    #[serde(with = "decimal_u256")]
    pub unmatched_sale_wei: U256,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsBundle {
    pub address: Address,
    pub transaction_count: usize,
    #[serde(with = "decimal_u256")]
    pub eth_sent_wei: U256,
    #[serde(with = "decimal_u256")]
    pub eth_received_wei: U256,
    pub eth_sent: f64,
    pub eth_received: f64,
    pub avg_gas_price_gwei: f64,
    pub token_transfer_counts: BTreeMap<String, u64>,
    pub activity_score: f64,
    pub risk_scores: RiskScores,
    pub opportunity_scores: OpportunityScores,
    pub trust_scores: TrustScores,
    pub volatility_scores: VolatilityScores,
    pub capital_gains: CapitalGainsEstimate,
}

/// Counterparties bucketed by how often the wallet deals with them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudRiskSummary {
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
    pub flagged: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveCounterparty {
    pub address: Address,
    pub transaction_count: usize,
}

/// Cross-chain activity overview for one wallet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub total_transactions: usize,
    pub transactions_by_chain: BTreeMap<String, usize>,
    pub transactions_by_layer: BTreeMap<String, usize>,
    pub interacting_wallets: usize,
    pub interacting_wallet_transactions: usize,
    pub most_active_wallet: Option<ActiveCounterparty>,
    pub fraud_risk_summary: FraudRiskSummary,
}
