//! Relationship-based risk classification
//!
//! Precedence across every record of the dataset:
//! grandparent → FAIL, parent → WARNING, child → WARNING, otherwise PASS.
//! Evidence enrichment only ever appends to the description.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use crate::blockchain::{fetch_across_chains, Chain};
use crate::core::{AddressTarget, Analyzer, TransactionSource};
use crate::dataset::{Dataset, RelationshipMatch};
use crate::models::*;
use crate::utils::{ForensicsError, Result};

pub struct RiskClassifier;

impl RiskClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Pure status computation from the dataset. `tree`, when given, only adds
    /// context about flagged neighbours to the description.
    pub fn classify(address: &Address, dataset: &Dataset, tree: Option<&FamilyTree>) -> RiskResult {
        let found = dataset.find_relationship(address);
        let mut result = match (found.role, found.record) {
            (Role::Grandparent, Some(record)) => RiskResult::new(
                address.as_str(),
                RiskStatus::Fail,
                format!(
                    "Address {} is a grandparent flagged for direct involvement in illicit activities.",
                    address
                ),
            )
            .with_related(RelatedAddresses {
                grandparent: record.grandparent.clone(),
                parents: record.parents.clone(),
                children: record.children.values().flatten().cloned().collect(),
            }),
            (Role::Parent, Some(record)) => RiskResult::new(
                address.as_str(),
                RiskStatus::Warning,
                format!("Address {} is a parent flagged for indirect involvement.", address),
            )
            .with_related(RelatedAddresses {
                grandparent: record.grandparent.clone(),
                parents: record.parents.clone(),
                children: record.children.get(address).cloned().unwrap_or_default(),
            }),
            (Role::Child, Some(record)) => child_result(address, record, &found),
            _ => RiskResult::new(
                address.as_str(),
                RiskStatus::Pass,
                format!("Address {} is not involved in flagged activities.", address),
            ),
        };

        if let Some(tree) = tree {
            let flagged: Vec<String> = tree
                .addresses()
                .into_iter()
                .filter(|a| a != address && dataset.is_flagged(a))
                .map(|a| a.to_string())
                .collect();
            if !flagged.is_empty() {
                result.description.push_str(&format!(
                    "\nTransaction neighbourhood includes {} flagged address(es): {}",
                    flagged.len(),
                    flagged.join(", ")
                ));
            }
        }

        result
    }

    /// Classify every address of a tree, root included
    pub fn classify_tree(tree: &FamilyTree, dataset: &Dataset) -> BTreeMap<Address, RiskResult> {
        tree.addresses()
            .into_iter()
            .map(|address| {
                let result = Self::classify(&address, dataset, None);
                (address, result)
            })
            .collect()
    }

    /// Append evidence (or the reason it is missing) without touching the status
    pub fn enrich(mut result: RiskResult, evidence: Result<Vec<Evidence>>) -> RiskResult {
        match evidence {
            Ok(evidence) if evidence.is_empty() => {
                result.description.push_str("\nNo transactions with flagged addresses found.");
            }
            Ok(evidence) => {
                for item in &evidence {
                    result.description.push('\n');
                    result.description.push_str(&item.to_string());
                }
                result.evidence = evidence;
            }
            Err(e) => {
                tracing::warn!("Evidence for {} unavailable: {}", result.address, e);
                result
                    .description
                    .push_str(&format!("\nTransaction details unavailable: {}", e));
            }
        }
        result
    }
}

fn child_result(address: &Address, record: &RelationshipRecord, found: &RelationshipMatch<'_>) -> RiskResult {
    let parent = found.via_parent.cloned().unwrap_or_else(|| record.grandparent.clone());
    let siblings = record.children.get(&parent).cloned().unwrap_or_default();

    RiskResult::new(
        address.as_str(),
        RiskStatus::Warning,
        format!(
            "Address {} is a child flagged for indirect involvement through parent {}.",
            address, parent
        ),
    )
    .with_related(RelatedAddresses {
        grandparent: record.grandparent.clone(),
        parents: BTreeSet::from([parent]),
        children: siblings,
    })
}

impl Default for RiskClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Analyzer for RiskClassifier {
    fn name(&self) -> &'static str {
        "relationship"
    }

    async fn analyze(&self, target: &AddressTarget) -> Result<AnalysisResult> {
        let classification = Self::classify(&target.address, &target.dataset, None);

        let (score, severity) = match classification.status {
            RiskStatus::Fail => (100, Severity::Critical),
            RiskStatus::Warning => (60, Severity::High),
            _ => (0, Severity::Info),
        };

        let mut result = AnalysisResult::new(score);
        if classification.is_flagged() {
            result.add_finding(
                Finding::new(severity, Category::Relationship, classification.description.clone())
                    .with_evidence(serde_json::to_value(&classification.related_addresses)?),
            );
        }
        Ok(result)
    }

    fn weight(&self) -> f64 {
        1.0
    }
}

/// Fetches the transactions that tie a flagged address to the rest of the
/// flagged data
pub struct EvidenceCollector {
    source: Arc<dyn TransactionSource>,
    chains: Vec<Chain>,
}

impl EvidenceCollector {
    pub fn new(source: Arc<dyn TransactionSource>, chains: Vec<Chain>) -> Self {
        Self { source, chains }
    }

    /// Fails only when no chain could be fetched at all
    pub async fn collect(&self, address: &Address, flagged: &HashSet<Address>) -> Result<Vec<Evidence>> {
        let kinds = [TxKind::Regular, TxKind::Internal];
        let fetch = fetch_across_chains(self.source.as_ref(), address, &self.chains, &kinds).await;

        if !self.chains.is_empty() && fetch.failures.len() == self.chains.len() {
            let reasons: Vec<String> = fetch
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.chain, f.reason))
                .collect();
            return Err(ForensicsError::ClassificationError(reasons.join("; ")));
        }

        Ok(evidence_from(&fetch.transactions, address, flagged))
    }
}

/// First transaction of each native kind whose counterparty is flagged
pub fn evidence_from(transactions: &[Transaction], address: &Address, flagged: &HashSet<Address>) -> Vec<Evidence> {
    [TxKind::Regular, TxKind::Internal]
        .iter()
        .filter_map(|kind| {
            transactions.iter().find(|tx| {
                tx.kind == *kind
                    && tx
                        .counterparty(address)
                        .map_or(false, |other| other != address && flagged.contains(other))
            })
        })
        .map(|tx| Evidence {
            transaction_type: match tx.kind {
                TxKind::Internal => "internal".to_string(),
                _ => "regular".to_string(),
            },
            transaction_hash: tx.hash.clone(),
            from: tx.from.clone(),
            to: tx.to.clone(),
            explorer_url: tx.explorer_url(),
        })
        .collect()
}
