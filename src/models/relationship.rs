use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use super::address::Address;

/// One flagged family from the dataset: a directly flagged grandparent, the
/// parents it funded, and the children each parent funded in turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub grandparent: Address,
    pub parents: BTreeSet<Address>,
    pub children: BTreeMap<Address, BTreeSet<Address>>,
}

impl RelationshipRecord {
    pub fn new(grandparent: Address) -> Self {
        Self {
            grandparent,
            parents: BTreeSet::new(),
            children: BTreeMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: Address) -> Self {
        self.parents.insert(parent);
        self
    }

    pub fn with_child(mut self, parent: Address, child: Address) -> Self {
        self.children.entry(parent).or_default().insert(child);
        self
    }

    /// The parent whose children list contains `address`, if any
    pub fn parent_of(&self, address: &Address) -> Option<&Address> {
        self.children
            .iter()
            .find(|(_, kids)| kids.contains(address))
            .map(|(parent, _)| parent)
    }

    /// Every address this record mentions
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        std::iter::once(&self.grandparent)
            .chain(self.parents.iter())
            .chain(self.children.keys())
            .chain(self.children.values().flatten())
    }
}

/// Label for a recognized entity (exchange, bridge, mixer, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownOrigin {
    pub address: Address,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Position of an address inside a relationship record, ordered by precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    None,
    Child,
    Parent,
    Grandparent,
}
