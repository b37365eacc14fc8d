use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use crate::blockchain::Chain;
use crate::core::TransactionSource;
use crate::models::{Address, Transaction, TxKind};
use crate::utils::{ForensicsError, Result};

/// One entry of a snapshot file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub chain: Chain,
    pub address: Address,
    pub transactions: Vec<Transaction>,
}

/// Frozen transaction history served from memory.
///
/// Used for offline runs (`--snapshot`) and for tests. Failures and latency can
/// be injected per address.
#[derive(Debug, Default)]
pub struct SnapshotSource {
    history: HashMap<(Chain, Address), Vec<Transaction>>,
    failing: HashSet<Address>,
    delays: HashMap<Address, Duration>,
    calls: AtomicUsize,
}

impl SnapshotSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every transaction under both of its parties
    pub fn from_transactions(transactions: impl IntoIterator<Item = Transaction>) -> Self {
        let mut source = Self::new();
        for tx in transactions {
            source.add_transaction(tx);
        }
        source
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let entries: Vec<SnapshotEntry> = serde_json::from_str(&text)?;

        let mut source = Self::new();
        for entry in entries {
            source.insert(entry.chain, entry.address, entry.transactions);
        }

        tracing::info!("📦 Loaded snapshot with {} address histories", source.history.len());
        Ok(source)
    }

    pub fn insert(&mut self, chain: Chain, address: Address, transactions: Vec<Transaction>) {
        self.history.entry((chain, address)).or_default().extend(transactions);
    }

    pub fn add_transaction(&mut self, tx: Transaction) {
        self.history
            .entry((tx.chain, tx.from.clone()))
            .or_default()
            .push(tx.clone());
        if tx.to != tx.from {
            self.history.entry((tx.chain, tx.to.clone())).or_default().push(tx);
        }
    }

    /// Every fetch for `address` fails with `UpstreamUnavailable`
    pub fn with_failure(mut self, address: Address) -> Self {
        self.failing.insert(address);
        self
    }

    /// Every fetch for `address` sleeps first
    pub fn with_delay(mut self, address: Address, delay: Duration) -> Self {
        self.delays.insert(address, delay);
        self
    }

    /// Number of fetches served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionSource for SnapshotSource {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    async fn fetch_transactions(
        &self,
        address: &Address,
        chain: Chain,
        kinds: &[TxKind],
    ) -> Result<Vec<Transaction>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(address) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing.contains(address) {
            return Err(ForensicsError::UpstreamUnavailable {
                attempts: 1,
                reason: format!("injected failure for {}", address),
            });
        }

        Ok(self
            .history
            .get(&(chain, address.clone()))
            .map(|txs| {
                txs.iter()
                    .filter(|tx| kinds.contains(&tx.kind))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::U256;

    fn addr(n: u8) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    #[tokio::test]
    async fn test_indexes_both_parties_and_filters_kinds() {
        let source = SnapshotSource::from_transactions(vec![
            Transaction::new("0x1", addr(1), addr(2), U256::one(), Chain::Ethereum, TxKind::Regular),
            Transaction::new("0x2", addr(2), addr(3), U256::one(), Chain::Ethereum, TxKind::TokenTransfer),
        ]);

        let all = source.fetch_transactions(&addr(2), Chain::Ethereum, &TxKind::ALL).await.unwrap();
        assert_eq!(all.len(), 2);

        let regular = source
            .fetch_transactions(&addr(2), Chain::Ethereum, &[TxKind::Regular])
            .await
            .unwrap();
        assert_eq!(regular.len(), 1);

        let other_chain = source.fetch_transactions(&addr(2), Chain::Base, &TxKind::ALL).await.unwrap();
        assert!(other_chain.is_empty());
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let source = SnapshotSource::new().with_failure(addr(9));
        let result = source.fetch_transactions(&addr(9), Chain::Ethereum, &TxKind::ALL).await;
        assert!(matches!(result, Err(ForensicsError::UpstreamUnavailable { .. })));
    }

    #[test]
    fn test_load_snapshot_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::json!([{
            "chain": "polygon",
            "address": "0x0000000000000000000000000000000000000001",
            "transactions": [{
                "hash": "0xaa",
                "from": "0x0000000000000000000000000000000000000001",
                "to": "0x0000000000000000000000000000000000000002",
                "valueWei": "10",
                "timestamp": 1,
                "chain": "polygon",
                "kind": "Regular"
            }]
        }]);
        std::fs::write(file.path(), json.to_string()).unwrap();

        let source = SnapshotSource::load(file.path()).unwrap();
        assert_eq!(source.history.len(), 1);
    }
}
