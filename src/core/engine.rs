use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use crate::analyzers::{
    evidence_from, CounterpartyAnalyzer, DustingAnalyzer, EvidenceCollector, HeuristicAnalyzer,
    RiskClassifier,
};
use crate::blockchain::{fetch_across_chains, fetch_or_empty, Chain, ChainFetch};
use crate::config::ForensicsConfig;
use crate::core::{AddressTarget, Analyzer, TransactionSource};
use crate::dataset::{Dataset, DatasetState};
use crate::graph::{FamilyTreeBuilder, RiskGraph};
use crate::metrics;
use crate::models::address::validate;
use crate::models::*;
use crate::utils::{ForensicsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OriginStatus {
    MatchFound,
    NoMatch,
    InvalidAddress,
}

/// Known-origin lookup for one candidate plus its activity per chain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginReport {
    pub address: String,
    pub status: OriginStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<KnownOrigin>,
    pub transactions_by_chain: BTreeMap<String, usize>,
    /// Labelled entities among the candidate's counterparties
    pub labelled_counterparties: Vec<KnownOrigin>,
}

/// Entry point for every inbound operation.
///
/// Holds the transaction source and the dataset explicitly; nothing is read
/// from global state.
pub struct ForensicsEngine {
    source: Arc<dyn TransactionSource>,
    dataset: DatasetState,
    config: ForensicsConfig,
    analyzers: Vec<Arc<dyn Analyzer>>,
}

impl ForensicsEngine {
    pub fn new(source: Arc<dyn TransactionSource>, dataset: DatasetState, config: ForensicsConfig) -> Self {
        Self {
            source,
            dataset,
            config,
            analyzers: Vec::new(),
        }
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzers.push(analyzer);
        self
    }

    pub fn with_default_analyzers(self) -> Self {
        let scoring = self.config.scoring.clone();
        self.with_analyzer(Arc::new(RiskClassifier::new()))
            .with_analyzer(Arc::new(CounterpartyAnalyzer::new(scoring.clone())))
            .with_analyzer(Arc::new(DustingAnalyzer::new(
                scoring.dust_monitor_threshold,
                scoring.dusting_weight,
            )))
            .with_analyzer(Arc::new(HeuristicAnalyzer::new(scoring)))
    }

    pub fn config(&self) -> &ForensicsConfig {
        &self.config
    }

    pub fn dataset(&self) -> &DatasetState {
        &self.dataset
    }

    /// `None` means every configured chain; an unknown name yields no chains
    pub fn resolve_chains(&self, chain: Option<&str>) -> Vec<Chain> {
        match chain {
            None => self.config.chains.clone(),
            Some(name) => match Chain::resolve(name) {
                Some(chain) => vec![chain],
                None => {
                    tracing::warn!("⚠️  Unsupported chain '{}', no transactions will be fetched", name);
                    Vec::new()
                }
            },
        }
    }

    /// One result per candidate, in input order
    pub async fn classify_addresses(&self, candidates: &[String], chain: Option<&str>) -> Vec<RiskResult> {
        let dataset = match self.dataset.ready() {
            Ok(dataset) => Arc::clone(dataset),
            Err(e) => {
                tracing::error!("❌ Cannot classify {} addresses: {}", candidates.len(), e);
                return candidates
                    .iter()
                    .map(|candidate| RiskResult::error(candidate.as_str(), e.to_string()))
                    .collect();
            }
        };

        let chains = self.resolve_chains(chain);
        tracing::info!("🔍 Classifying {} addresses on {} chains", candidates.len(), chains.len());

        let mut pending = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let address = match validate(candidate) {
                Ok(address) => address,
                Err(raw) => {
                    pending.push((candidate.clone(), None));
                    tracing::debug!("Invalid candidate {:?}", raw);
                    continue;
                }
            };

            let collector = EvidenceCollector::new(Arc::clone(&self.source), chains.clone());
            let dataset = Arc::clone(&dataset);
            let handle = tokio::spawn(async move {
                let result = RiskClassifier::classify(&address, &dataset, None);
                if !result.is_flagged() {
                    return result;
                }
                let evidence = collector.collect(&address, dataset.flagged_addresses()).await;
                RiskClassifier::enrich(result, evidence)
            });
            pending.push((candidate.clone(), Some(handle)));
        }

        let mut results = Vec::with_capacity(pending.len());
        for (candidate, handle) in pending {
            let result = match handle {
                None => RiskResult::error(
                    candidate.as_str(),
                    ForensicsError::InvalidAddress(candidate.clone()).to_string(),
                ),
                Some(handle) => match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!("Classification task for {} failed: {}", candidate, e);
                        RiskResult::error(
                            candidate.as_str(),
                            ForensicsError::ClassificationError(e.to_string()).to_string(),
                        )
                    }
                },
            };
            results.push(result);
        }

        let flagged = results.iter().filter(|r| r.is_flagged()).count();
        let errors = results.iter().filter(|r| r.status == RiskStatus::Error).count();
        tracing::info!("✅ Classified {} addresses: {} flagged, {} errors", results.len(), flagged, errors);
        results
    }

    /// Transactions of `address` on the requested chains; failing chains are
    /// listed in the result, not raised
    pub async fn fetch_history(&self, address: &str, chain: Option<&str>) -> Result<ChainFetch> {
        let address = Address::parse(address)?;
        let chains = self.resolve_chains(chain);
        Ok(fetch_across_chains(self.source.as_ref(), &address, &chains, &TxKind::ALL).await)
    }

    pub async fn build_family_tree(&self, root: &str, chain: Option<&str>) -> Result<FamilyTree> {
        let root = Address::parse(root)?;
        let builder = FamilyTreeBuilder::new(Arc::clone(&self.source), self.resolve_chains(chain))
            .with_config(&self.config.graph);
        Ok(builder.build(&root).await)
    }

    pub fn compute_metrics(&self, address: &str, transactions: &[Transaction]) -> Result<MetricsBundle> {
        let address = Address::parse(address)?;
        Ok(metrics::compute_metrics(&address, transactions, &self.config.scoring))
    }

    /// Family tree with every node coloured by its classification. Without a
    /// dataset every node is ERROR.
    pub async fn risk_graph(&self, root: &str, chain: Option<&str>) -> Result<RiskGraph> {
        let tree = self.build_family_tree(root, chain).await?;

        let graph = match self.dataset.ready() {
            Ok(dataset) => {
                let classified = RiskClassifier::classify_tree(&tree, dataset);
                RiskGraph::from_tree(&tree, |address| {
                    classified
                        .get(address)
                        .map(|result| result.status)
                        .unwrap_or(RiskStatus::Error)
                })
            }
            Err(e) => {
                tracing::warn!("Rendering graph without classification: {}", e);
                RiskGraph::from_tree(&tree, |_| RiskStatus::Error)
            }
        };
        Ok(graph)
    }

    pub async fn check_origins(&self, candidates: &[String], chain: Option<&str>) -> Vec<OriginReport> {
        let chains = self.resolve_chains(chain);
        let empty = Dataset::empty();
        let dataset: &Dataset = match self.dataset.ready() {
            Ok(dataset) => dataset.as_ref(),
            Err(_) => &empty,
        };

        let mut reports = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let address = match validate(candidate) {
                Ok(address) => address,
                Err(raw) => {
                    reports.push(OriginReport {
                        address: raw,
                        status: OriginStatus::InvalidAddress,
                        origin: None,
                        transactions_by_chain: BTreeMap::new(),
                        labelled_counterparties: Vec::new(),
                    });
                    continue;
                }
            };

            let per_chain = join_all(
                chains
                    .iter()
                    .map(|&c| fetch_or_empty(self.source.as_ref(), &address, c, &TxKind::ALL)),
            )
            .await;

            let by_chain: BTreeMap<String, usize> = chains
                .iter()
                .zip(&per_chain)
                .map(|(c, txs)| (c.name().to_string(), txs.len()))
                .collect();

            let counterparties: BTreeSet<&Address> = per_chain
                .iter()
                .flatten()
                .filter_map(|tx| tx.counterparty(&address))
                .collect();
            let labelled = counterparties
                .into_iter()
                .filter_map(|c| dataset.find_known_origin(c).cloned())
                .collect();

            let origin = dataset.find_known_origin(&address).cloned();
            reports.push(OriginReport {
                address: address.to_string(),
                status: if origin.is_some() {
                    OriginStatus::MatchFound
                } else {
                    OriginStatus::NoMatch
                },
                origin,
                transactions_by_chain: by_chain,
                labelled_counterparties: labelled,
            });
        }

        reports
    }

    /// Classification, metrics and every analyzer for one address
    pub async fn analyze_address(&self, address: &str, chain: Option<&str>) -> Result<AddressReport> {
        let address = Address::parse(address)?;
        let dataset = Arc::clone(self.dataset.ready()?);
        let chains = self.resolve_chains(chain);

        tracing::info!("🔍 Analyzing {} on {} chains", address, chains.len());
        let fetch = fetch_across_chains(self.source.as_ref(), &address, &chains, &TxKind::ALL).await;

        let mut classification = RiskClassifier::classify(&address, &dataset, None);
        if classification.is_flagged() {
            let evidence = if !chains.is_empty() && fetch.failures.len() == chains.len() {
                Err(ForensicsError::ClassificationError("no chain returned transactions".into()))
            } else {
                Ok(evidence_from(&fetch.transactions, &address, dataset.flagged_addresses()))
            };
            classification = RiskClassifier::enrich(classification, evidence);
        }

        let metrics = metrics::compute_metrics(&address, &fetch.transactions, &self.config.scoring);
        let summary = metrics::financial_summary(&address, &fetch.transactions, &dataset, &self.config.scoring);

        let target = AddressTarget::new(address.clone(), Arc::clone(&dataset))
            .with_chains(chains.clone())
            .with_transactions(fetch.transactions);

        let mut all_findings = Vec::new();
        let mut recommendations: Vec<String> = Vec::new();
        let mut analyzer_results = HashMap::new();
        let mut weighted_score = 0.0;
        let mut total_weight = 0.0;

        for analyzer in &self.analyzers {
            if !analyzer.can_analyze(&target) {
                continue;
            }

            match analyzer.analyze(&target).await {
                Ok(result) => {
                    let weight = analyzer.weight();
                    weighted_score += result.risk_score as f64 * weight;
                    total_weight += weight;

                    all_findings.extend(result.findings.clone());
                    for recommendation in &result.recommendations {
                        if !recommendations.contains(recommendation) {
                            recommendations.push(recommendation.clone());
                        }
                    }
                    analyzer_results.insert(analyzer.name().to_string(), result);
                }
                Err(e) => {
                    tracing::warn!("Analyzer '{}' failed: {}", analyzer.name(), e);
                }
            }
        }

        for failure in &fetch.failures {
            all_findings.push(Finding::new(
                Severity::Info,
                Category::Relationship,
                format!("No data from {}: {}", failure.chain, failure.reason),
            ));
        }

        if classification.status == RiskStatus::Warning {
            recommendations.insert(0, format!("Monitor {}: indirectly linked to flagged activity", address));
        }

        all_findings.sort_by(|a, b| b.severity.cmp(&a.severity));

        let risk_score = if total_weight > 0.0 {
            (weighted_score / total_weight) as u8
        } else {
            0
        };
        let confidence = calculate_confidence(&analyzer_results);

        Ok(AddressReport {
            address: address.to_string(),
            chains,
            classification,
            risk_score,
            confidence,
            metrics,
            summary,
            findings: all_findings,
            recommendations,
            analyzer_results,
        })
    }
}

/// Agreement between analyzers: low spread of scores means high confidence
fn calculate_confidence(results: &HashMap<String, AnalysisResult>) -> f64 {
    if results.is_empty() {
        return 0.0;
    }

    let scores: Vec<f64> = results.values().map(|r| r.risk_score as f64).collect();
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;

    let variance: f64 = scores
        .iter()
        .map(|s| {
            let diff = s - mean;
            diff * diff
        })
        .sum::<f64>()
        / scores.len() as f64;

    let std_dev = variance.sqrt();
    ((50.0 - std_dev.min(50.0)) / 50.0).clamp(0.0, 1.0)
}
