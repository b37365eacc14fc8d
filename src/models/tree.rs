use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use super::address::Address;
use crate::blockchain::Chain;

/// Two-level relationship tree discovered from transactions around a root.
///
/// Sets and ordered maps keep the structure independent of the order in
/// which concurrent fetches complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyTree {
    pub root: Address,
    pub parents: BTreeSet<Address>,
    pub children: BTreeMap<Address, BTreeSet<Address>>,
    #[serde(default)]
    pub stats: TreeStats,
}

/// Bookkeeping about how complete the tree is; excluded from equality of
/// the address structure via [`FamilyTree::same_structure`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    pub chains: Vec<Chain>,
    pub transactions_scanned: usize,
    pub failed_fetches: usize,
    pub truncated_parents: usize,
}

impl FamilyTree {
    pub fn new(root: Address) -> Self {
        Self {
            root,
            parents: BTreeSet::new(),
            children: BTreeMap::new(),
            stats: TreeStats::default(),
        }
    }

    /// Every distinct address in the tree, root included
    pub fn addresses(&self) -> BTreeSet<Address> {
        let mut all = BTreeSet::new();
        all.insert(self.root.clone());
        all.extend(self.parents.iter().cloned());
        for (parent, kids) in &self.children {
            all.insert(parent.clone());
            all.extend(kids.iter().cloned());
        }
        all
    }

    pub fn child_count(&self) -> usize {
        self.children.values().map(|kids| kids.len()).sum()
    }

    /// Structural equality ignoring fetch statistics
    pub fn same_structure(&self, other: &FamilyTree) -> bool {
        self.root == other.root && self.parents == other.parents && self.children == other.children
    }

    /// Union another tree for the same root into this one
    pub fn merge(&mut self, other: FamilyTree) {
        self.parents.extend(other.parents);
        for (parent, kids) in other.children {
            self.children.entry(parent).or_default().extend(kids);
        }
        for chain in other.stats.chains {
            if !self.stats.chains.contains(&chain) {
                self.stats.chains.push(chain);
            }
        }
        self.stats.transactions_scanned += other.stats.transactions_scanned;
        self.stats.failed_fetches += other.stats.failed_fetches;
        self.stats.truncated_parents += other.stats.truncated_parents;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    #[test]
    fn test_merge_unions_children() {
        let mut a = FamilyTree::new(addr(1));
        a.parents.insert(addr(2));
        a.children.entry(addr(2)).or_default().insert(addr(3));

        let mut b = FamilyTree::new(addr(1));
        b.parents.insert(addr(2));
        b.parents.insert(addr(4));
        b.children.entry(addr(2)).or_default().insert(addr(5));

        a.merge(b);
        assert_eq!(a.parents.len(), 2);
        assert_eq!(a.children[&addr(2)].len(), 2);
        assert_eq!(a.addresses().len(), 5);
        assert_eq!(a.child_count(), 2);
    }
}
