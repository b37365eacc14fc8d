pub mod chains;
pub mod client;
pub mod retry;
pub mod snapshot;

pub use chains::{Chain, Layer, DEFAULT_CHAINS};
pub use client::ExplorerClient;
pub use retry::RetryPolicy;
pub use snapshot::{SnapshotEntry, SnapshotSource};

use futures::future::join_all;
use serde::Serialize;
use crate::core::TransactionSource;
use crate::models::{Address, Transaction, TxKind};

/// A chain whose fetch failed during a fan-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainFailure {
    pub chain: Chain,
    pub reason: String,
}

/// Transactions gathered across chains plus the chains that contributed nothing
#[derive(Debug, Clone, Default)]
pub struct ChainFetch {
    pub transactions: Vec<Transaction>,
    pub failures: Vec<ChainFailure>,
}

impl ChainFetch {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetch, logging any error and treating it as an empty history
pub async fn fetch_or_empty(
    source: &dyn TransactionSource,
    address: &Address,
    chain: Chain,
    kinds: &[TxKind],
) -> Vec<Transaction> {
    match source.fetch_transactions(address, chain, kinds).await {
        Ok(transactions) => transactions,
        Err(e) => {
            tracing::warn!(
                "⚠️  {} fetch for {} on {} failed, continuing without it: {}",
                source.name(),
                address,
                chain,
                e
            );
            Vec::new()
        }
    }
}

/// Fetch one address on every chain concurrently.
///
/// A failing chain contributes no transactions and is recorded in
/// `failures`; the other chains are unaffected.
pub async fn fetch_across_chains(
    source: &dyn TransactionSource,
    address: &Address,
    chains: &[Chain],
    kinds: &[TxKind],
) -> ChainFetch {
    let results = join_all(chains.iter().map(|&chain| async move {
        (chain, source.fetch_transactions(address, chain, kinds).await)
    }))
    .await;

    let mut fetch = ChainFetch::default();
    for (chain, result) in results {
        match result {
            Ok(transactions) => fetch.transactions.extend(transactions),
            Err(e) => {
                tracing::warn!("⚠️  No data for {} on {}: {}", address, chain, e);
                fetch.failures.push(ChainFailure {
                    chain,
                    reason: e.to_string(),
                });
            }
        }
    }

    fetch
}
