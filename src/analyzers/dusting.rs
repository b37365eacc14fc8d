use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use crate::core::{AddressTarget, Analyzer};
use crate::models::transaction::{units_to_wei, wei_to_units};
use crate::models::*;
use crate::utils::Result;

/// A tiny incoming transfer that looks like dusting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DustingPattern {
    pub transaction_hash: String,
    pub from: Address,
    pub to: Address,
    pub value_units: f64,
    pub timestamp: String,
}

/// Flags incoming native transfers below the monitoring threshold
pub struct DustingAnalyzer {
    threshold_units: f64,
    weight_per_pattern: f64,
}

impl DustingAnalyzer {
    pub fn new(threshold_units: f64, weight_per_pattern: f64) -> Self {
        Self {
            threshold_units,
            weight_per_pattern,
        }
    }

    pub fn patterns(&self, target: &AddressTarget) -> Vec<DustingPattern> {
        let threshold = units_to_wei(self.threshold_units);
        target
            .transactions
            .iter()
            .filter(|tx| {
                tx.kind.is_native()
                    && tx.to == target.address
                    && tx.from != target.address
                    && !tx.value_wei.is_zero()
                    && tx.value_wei < threshold
            })
            .map(|tx| DustingPattern {
                transaction_hash: tx.hash.clone(),
                from: tx.from.clone(),
                to: tx.to.clone(),
                value_units: wei_to_units(tx.value_wei),
                timestamp: iso_timestamp(tx.timestamp),
            })
            .collect()
    }
}

fn iso_timestamp(seconds: u64) -> String {
    i64::try_from(seconds)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

#[async_trait]
impl Analyzer for DustingAnalyzer {
    fn name(&self) -> &'static str {
        "dusting"
    }

    async fn analyze(&self, target: &AddressTarget) -> Result<AnalysisResult> {
        let patterns = self.patterns(target);
        let score = (patterns.len() as f64 * self.weight_per_pattern).min(100.0) as u8;
        let mut result = AnalysisResult::new(score);

        if patterns.is_empty() {
            result.add_recommendation("No dusting patterns detected. Your wallet appears safe.");
            return Ok(result);
        }

        tracing::info!("🧹 {} dusting transfers into {}", patterns.len(), target.address);

        let senders: std::collections::BTreeSet<&Address> = patterns.iter().map(|p| &p.from).collect();
        result.add_finding(
            Finding::new(
                Severity::from_score(score).max(Severity::Low),
                Category::Dusting,
                format!(
                    "{} dust transfers below {} from {} sender(s)",
                    patterns.len(),
                    self.threshold_units,
                    senders.len()
                ),
            )
            .with_evidence(serde_json::to_value(patterns.iter().take(10).collect::<Vec<_>>())?),
        );

        result.add_recommendation("Your wallet has been dusted. Avoid interacting with these transactions.");
        result.add_recommendation("Consider transferring funds to a new wallet.");
        result.add_recommendation("Enable additional security measures like hardware wallets.");
        result
            .metadata
            .insert("dustingPatterns".into(), serde_json::to_value(&patterns)?);

        Ok(result)
    }

    fn weight(&self) -> f64 {
        0.6
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Chain;
    use crate::dataset::Dataset;
    use std::sync::Arc;

    fn addr(n: u8) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    #[tokio::test]
    async fn test_detects_incoming_dust() {
        let me = addr(1);
        let txs = vec![
            Transaction::new("0xd1", addr(7), me.clone(), units_to_wei(0.0005), Chain::Ethereum, TxKind::Regular)
                .with_timestamp(1_700_000_000),
            Transaction::new("0xd2", addr(8), me.clone(), units_to_wei(0.5), Chain::Ethereum, TxKind::Regular),
            Transaction::new("0xd3", me.clone(), addr(8), units_to_wei(0.0001), Chain::Ethereum, TxKind::Regular),
            Transaction::new("0xd4", addr(9), me.clone(), units_to_wei(0.0), Chain::Ethereum, TxKind::Regular),
        ];
        let target = AddressTarget::new(me, Arc::new(Dataset::empty())).with_transactions(txs);

        let analyzer = DustingAnalyzer::new(0.001, 10.0);
        let patterns = analyzer.patterns(&target);
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].transaction_hash, "0xd1");
        assert_eq!(patterns[0].timestamp, "2023-11-14T22:13:20Z");

        let result = analyzer.analyze(&target).await.unwrap();
        assert_eq!(result.risk_score, 10);
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.recommendations.len(), 3);
    }

    #[tokio::test]
    async fn test_clean_wallet() {
        let target = AddressTarget::new(addr(1), Arc::new(Dataset::empty()));
        let result = DustingAnalyzer::new(0.001, 10.0).analyze(&target).await.unwrap();
        assert_eq!(result.risk_score, 0);
        assert!(result.findings.is_empty());
        assert_eq!(result.recommendations.len(), 1);
    }
}
