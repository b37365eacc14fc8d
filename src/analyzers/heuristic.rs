use async_trait::async_trait;
use crate::config::ScoringConfig;
use crate::core::{AddressTarget, Analyzer};
use crate::metrics::risk_scores;
use crate::models::*;
use crate::utils::Result;

/// Turns the heuristic risk scores into findings
pub struct HeuristicAnalyzer {
    scoring: ScoringConfig,
}

impl HeuristicAnalyzer {
    pub fn new(scoring: ScoringConfig) -> Self {
        Self { scoring }
    }
}

#[async_trait]
impl Analyzer for HeuristicAnalyzer {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn analyze(&self, target: &AddressTarget) -> Result<AnalysisResult> {
        let scores = risk_scores(&target.transactions, &target.address, &self.scoring);

        let checks = [
            (scores.targeted_attacks, Category::TargetedAttack, "High-value transfers suggest targeted attack exposure"),
            (scores.dusting, Category::Dusting, "Dust-sized transfers detected"),
            (scores.draining, Category::Draining, "Large cumulative outflow"),
            (scores.phishing, Category::Phishing, "Failed transactions suggest phishing attempts"),
        ];

        let findings = checks
            .into_iter()
            .filter(|(score, _, _)| *score > 0.0)
            .map(|(score, category, message)| {
                Finding::new(
                    Severity::from_score(score.round() as u8),
                    category,
                    format!("{} (score {:.0})", message, score),
                )
            })
            .collect();

        let mut result = AnalysisResult::new(scores.max().round() as u8).with_findings(findings);
        result
            .metadata
            .insert("riskScores".into(), serde_json::to_value(scores)?);
        Ok(result)
    }

    fn weight(&self) -> f64 {
        0.5
    }
}
