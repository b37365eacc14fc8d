use async_trait::async_trait;
use std::sync::Arc;
use crate::blockchain::Chain;
use crate::dataset::Dataset;
use crate::models::{Address, AnalysisResult, Transaction, TxKind};
use crate::utils::Result;

/// Anything that can produce normalized transactions for an address on a chain
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Fetch every transaction of the requested kinds.
    ///
    /// Errors here are contained by the callers in `blockchain`; they never
    /// abort a batch.
    async fn fetch_transactions(
        &self,
        address: &Address,
        chain: Chain,
        kinds: &[TxKind],
    ) -> Result<Vec<Transaction>>;
}

/// Input shared by every analyzer for one address
#[derive(Debug, Clone)]
pub struct AddressTarget {
    pub address: Address,
    pub chains: Vec<Chain>,
    pub transactions: Vec<Transaction>,
    pub dataset: Arc<Dataset>,
}

impl AddressTarget {
    pub fn new(address: Address, dataset: Arc<Dataset>) -> Self {
        Self {
            address,
            chains: Vec::new(),
            transactions: Vec::new(),
            dataset,
        }
    }

    pub fn with_chains(mut self, chains: Vec<Chain>) -> Self {
        self.chains = chains;
        self
    }

    pub fn with_transactions(mut self, transactions: Vec<Transaction>) -> Self {
        self.transactions = transactions;
        self
    }
}

/// Core abstraction: anything that analyzes an address
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Unique identifier for this analyzer
    fn name(&self) -> &'static str;

    /// Analyze an address and return findings
    async fn analyze(&self, target: &AddressTarget) -> Result<AnalysisResult>;

    /// Weight in ensemble voting (0.0 - 1.0)
    fn weight(&self) -> f64 {
        1.0
    }

    /// Can this analyzer run on this target?
    fn can_analyze(&self, _target: &AddressTarget) -> bool {
        true
    }
}
