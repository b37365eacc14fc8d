use async_trait::async_trait;
use std::collections::BTreeMap;
use crate::analyzers::RiskClassifier;
use crate::config::ScoringConfig;
use crate::core::{AddressTarget, Analyzer};
use crate::metrics::{counterparty_counts, fraud_risk_summary};
use crate::models::*;
use crate::utils::Result;

/// Looks at who the address deals with: flagged counterparties, labelled
/// entities and how concentrated the activity is
pub struct CounterpartyAnalyzer {
    scoring: ScoringConfig,
}

impl CounterpartyAnalyzer {
    pub fn new(scoring: ScoringConfig) -> Self {
        Self { scoring }
    }
}

#[async_trait]
impl Analyzer for CounterpartyAnalyzer {
    fn name(&self) -> &'static str {
        "counterparty"
    }

    async fn analyze(&self, target: &AddressTarget) -> Result<AnalysisResult> {
        let dataset = target.dataset.as_ref();
        let counts = counterparty_counts(&target.transactions, &target.address);

        // Ordered so findings come out the same on every run
        let ordered: BTreeMap<&Address, usize> = counts.iter().map(|(a, c)| (a, *c)).collect();

        let mut findings = Vec::new();
        let mut recommendations = Vec::new();
        let mut score = 0u32;

        for (counterparty, &interactions) in &ordered {
            if !dataset.is_flagged(counterparty) {
                continue;
            }

            let status = RiskClassifier::classify(counterparty, dataset, None).status;
            let (severity, points) = match status {
                RiskStatus::Fail => (Severity::Critical, 40),
                _ => (Severity::High, 20),
            };
            score += points;

            findings.push(
                Finding::new(
                    severity,
                    Category::FlaggedCounterparty,
                    format!(
                        "{} transaction(s) with {} counterparty {}",
                        interactions,
                        status,
                        counterparty
                    ),
                )
                .with_evidence(serde_json::json!({
                    "counterparty": counterparty,
                    "status": status,
                    "interactions": interactions,
                })),
            );

            if status == RiskStatus::Warning {
                recommendations.push(format!(
                    "Monitor {}: indirectly linked to flagged activity",
                    counterparty
                ));
            }
        }

        for counterparty in ordered.keys() {
            if let Some(origin) = dataset.find_known_origin(counterparty) {
                findings.push(Finding::new(
                    Severity::Info,
                    Category::KnownOrigin,
                    format!("Interacted with {} ({}) at {}", origin.name, origin.kind, counterparty),
                ));
            }
        }

        if findings.iter().any(|f| f.category == Category::FlaggedCounterparty) {
            tracing::warn!("🚨 {} has flagged counterparties", target.address);
            recommendations.push("Avoid further transfers with flagged counterparties.".to_string());
        }

        let buckets = fraud_risk_summary(&counts, dataset, &self.scoring);
        let mut result = AnalysisResult::new(score.min(100) as u8).with_findings(findings);
        result.recommendations = recommendations;
        result
            .metadata
            .insert("fraudRiskSummary".into(), serde_json::to_value(buckets)?);
        result
            .metadata
            .insert("interactingWallets".into(), serde_json::json!(counts.len()));

        Ok(result)
    }

    fn weight(&self) -> f64 {
        0.8
    }

    fn can_analyze(&self, target: &AddressTarget) -> bool {
        !target.transactions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::Chain;
    use crate::dataset::Dataset;
    use ethers::types::U256;
    use std::sync::Arc;

    fn addr(n: u8) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    #[tokio::test]
    async fn test_flagged_and_labelled_counterparties() {
        let record = RelationshipRecord::new(addr(0xa)).with_parent(addr(0xb));
        let origin = KnownOrigin {
            address: addr(0xe),
            name: "Binance 14".into(),
            kind: "exchange".into(),
        };
        let dataset = Arc::new(Dataset::new(vec![record], vec![origin]));

        let me = addr(1);
        let txs = vec![
            Transaction::new("0x1", addr(0xa), me.clone(), U256::one(), Chain::Ethereum, TxKind::Regular),
            Transaction::new("0x2", me.clone(), addr(0xb), U256::one(), Chain::Ethereum, TxKind::Regular),
            Transaction::new("0x3", addr(0xe), me.clone(), U256::one(), Chain::Ethereum, TxKind::Regular),
        ];
        let target = AddressTarget::new(me, dataset).with_transactions(txs);

        let analyzer = CounterpartyAnalyzer::new(ScoringConfig::default());
        assert!(analyzer.can_analyze(&target));

        let result = analyzer.analyze(&target).await.unwrap();
        assert_eq!(result.risk_score, 60);
        assert_eq!(result.findings[0].severity, Severity::Critical);
        assert_eq!(result.findings[1].severity, Severity::High);
        assert_eq!(result.findings[2].category, Category::KnownOrigin);
        assert!(result.recommendations.iter().any(|r| r.starts_with("Monitor")));
        assert_eq!(result.metadata["fraudRiskSummary"]["flagged"], 2);
    }
}
