use super::finding::Finding;
use super::metrics::{FinancialSummary, MetricsBundle};
use super::risk::{RiskResult, RiskStatus};
use crate::blockchain::Chain;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub risk_score: u8,
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl AnalysisResult {
    pub fn new(risk_score: u8) -> Self {
        Self {
            risk_score,
            findings: Vec::new(),
            recommendations: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_findings(mut self, findings: Vec<Finding>) -> Self {
        self.findings = findings;
        self
    }

    pub fn add_finding(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    pub fn add_recommendation(&mut self, recommendation: impl Into<String>) {
        self.recommendations.push(recommendation.into());
    }
}

/// Everything known about one address after a full analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressReport {
    pub address: String,
    pub chains: Vec<Chain>,
    pub classification: RiskResult,
    pub risk_score: u8,
    pub confidence: f64,
    pub metrics: MetricsBundle,
    pub summary: FinancialSummary,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
    pub analyzer_results: HashMap<String, AnalysisResult>,
}

impl std::fmt::Display for AddressReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "═══════════════════════════════════════════════════════════")?;
        writeln!(f, "                 WALLET FORENSICS REPORT")?;
        writeln!(f, "═══════════════════════════════════════════════════════════")?;
        writeln!(f)?;
        writeln!(f, "Address: {}", self.address)?;
        let chains: Vec<&str> = self.chains.iter().map(|c| c.name()).collect();
        writeln!(f, "Chains:  {}", chains.join(", "))?;
        writeln!(f)?;
        writeln!(f, "═══ CLASSIFICATION ═══")?;

        let status = self.classification.status;
        writeln!(f, "{} {}", status.emoji(), status)?;
        for line in self.classification.description.lines() {
            writeln!(f, "  {}", line)?;
        }
        writeln!(f, "Risk Score: {}/100", self.risk_score)?;
        writeln!(f, "Confidence: {:.1}%", self.confidence * 100.0)?;

        writeln!(f)?;
        writeln!(f, "═══ ACTIVITY ═══")?;
        writeln!(f, "Transactions:      {}", self.summary.total_transactions)?;
        writeln!(f, "Sent:              {:.6}", self.metrics.eth_sent)?;
        writeln!(f, "Received:          {:.6}", self.metrics.eth_received)?;
        writeln!(f, "Avg gas (gwei):    {:.2}", self.metrics.avg_gas_price_gwei)?;
        writeln!(f, "Counterparties:    {}", self.summary.interacting_wallets)?;
        let buckets = &self.summary.fraud_risk_summary;
        writeln!(
            f,
            "Counterparty risk: {} flagged / {} high / {} moderate / {} low",
            buckets.flagged, buckets.high, buckets.moderate, buckets.low
        )?;

        if !self.findings.is_empty() {
            writeln!(f)?;
            writeln!(f, "═══ FINDINGS ═══")?;

            let mut sorted_findings = self.findings.clone();
            sorted_findings.sort_by(|a, b| b.severity.cmp(&a.severity));

            for finding in sorted_findings.iter().take(10) {
                writeln!(f, "{} [{:?}] {}",
                    finding.severity.emoji(),
                    finding.category,
                    finding.message
                )?;
            }
        }

        if !self.recommendations.is_empty() {
            writeln!(f)?;
            writeln!(f, "═══ RECOMMENDATIONS ═══")?;
            for recommendation in &self.recommendations {
                writeln!(f, "• {}", recommendation)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "═══════════════════════════════════════════════════════════")?;

        Ok(())
    }
}

impl AddressReport {
    pub fn status(&self) -> RiskStatus {
        self.classification.status
    }
}
