use futures::{future::join_all, stream, StreamExt};
use std::collections::BTreeSet;
use std::sync::Arc;
use crate::blockchain::Chain;
use crate::config::GraphConfig;
use crate::core::TransactionSource;
use crate::models::{Address, FamilyTree, Transaction, TxKind};

/// Progress of one tree build, logged at each transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Init,
    FetchingRoot,
    ExpandingParents,
    Done,
}

/// Discovers the two-level relationship tree around a root address.
///
/// Expansion stops after the parents' counterparties; nothing is fetched for
/// children, so the build terminates on arbitrarily connected graphs.
pub struct FamilyTreeBuilder {
    source: Arc<dyn TransactionSource>,
    chains: Vec<Chain>,
    kinds: Vec<TxKind>,
    max_parents: Option<usize>,
    concurrency: usize,
}

impl FamilyTreeBuilder {
    pub fn new(source: Arc<dyn TransactionSource>, chains: Vec<Chain>) -> Self {
        Self {
            source,
            chains,
            kinds: TxKind::ALL.to_vec(),
            max_parents: None,
            concurrency: 8,
        }
    }

    pub fn with_config(mut self, config: &GraphConfig) -> Self {
        self.max_parents = config.max_parents;
        self.concurrency = config.concurrency.max(1);
        self
    }

    /// Build per chain concurrently and merge into one tree
    pub async fn build(&self, root: &Address) -> FamilyTree {
        let mut phase = BuildPhase::Init;
        tracing::debug!("🌳 {:?}: tree for {} on {} chains", phase, root, self.chains.len());

        let per_chain = join_all(self.chains.iter().map(|&chain| self.build_on_chain(root, chain))).await;

        let mut tree = FamilyTree::new(root.clone());
        for chain_tree in per_chain {
            tree.merge(chain_tree);
        }
        prune(&mut tree);

        phase = BuildPhase::Done;
        tracing::info!(
            "🌳 {:?}: {} → {} parents, {} children ({} fetches failed)",
            phase,
            root.shorten(6),
            tree.parents.len(),
            tree.child_count(),
            tree.stats.failed_fetches
        );
        tree
    }

    async fn build_on_chain(&self, root: &Address, chain: Chain) -> FamilyTree {
        let mut tree = FamilyTree::new(root.clone());
        tree.stats.chains.push(chain);

        let mut phase = BuildPhase::FetchingRoot;
        tracing::debug!("{:?}: {} on {}", phase, root, chain);

        let root_txs = match self.source.fetch_transactions(root, chain, &self.kinds).await {
            Ok(txs) => txs,
            Err(e) => {
                tracing::warn!("⚠️  Root fetch for {} on {} failed: {}", root, chain, e);
                tree.stats.failed_fetches += 1;
                return tree;
            }
        };
        tree.stats.transactions_scanned += root_txs.len();

        let all_parents = counterparties(&root_txs, root, &BTreeSet::new());
        let expand: Vec<Address> = match self.max_parents {
            Some(limit) if all_parents.len() > limit => {
                tracing::warn!(
                    "Expanding only {} of {} parents of {} on {}",
                    limit,
                    all_parents.len(),
                    root,
                    chain
                );
                tree.stats.truncated_parents += all_parents.len() - limit;
                all_parents.iter().take(limit).cloned().collect()
            }
            _ => all_parents.iter().cloned().collect(),
        };

        phase = BuildPhase::ExpandingParents;
        tracing::debug!("{:?}: {} parents on {}", phase, expand.len(), chain);

        let results: Vec<_> = stream::iter(expand)
            .map(|parent| async move {
                let result = self.source.fetch_transactions(&parent, chain, &self.kinds).await;
                (parent, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut excluded = all_parents.clone();
        excluded.insert(root.clone());

        for (parent, result) in results {
            match result {
                Ok(txs) => {
                    tree.stats.transactions_scanned += txs.len();
                    let kids = counterparties(&txs, &parent, &excluded);
                    if !kids.is_empty() {
                        tree.children.insert(parent, kids);
                    }
                }
                Err(e) => {
                    tracing::warn!("⚠️  Parent {} on {} has no recorded children: {}", parent, chain, e);
                    tree.stats.failed_fetches += 1;
                }
            }
        }

        tree.parents = all_parents;
        tree
    }
}

/// Distinct counterparties of `address`, minus itself and `excluded`
fn counterparties(
    transactions: &[Transaction],
    address: &Address,
    excluded: &BTreeSet<Address>,
) -> BTreeSet<Address> {
    transactions
        .iter()
        .filter_map(|tx| tx.counterparty(address))
        .filter(|other| *other != address && !excluded.contains(*other))
        .cloned()
        .collect()
}

/// After merging chains an address can be a parent on one chain and a child
/// on another; keep it only as a parent.
fn prune(tree: &mut FamilyTree) {
    let parents = tree.parents.clone();
    let root = tree.root.clone();
    for kids in tree.children.values_mut() {
        kids.retain(|kid| kid != &root && !parents.contains(kid));
    }
    tree.children.retain(|_, kids| !kids.is_empty());
}
