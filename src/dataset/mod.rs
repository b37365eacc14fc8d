//! Flagged relationship records and known-origin labels
//!
//! Loaded once, then shared read-only behind an `Arc` by every concurrent
//! classification.

pub mod loader;

pub use loader::{load_entries, LoadOutcome, SkippedEntry};

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use crate::config::DatasetPaths;
use crate::models::{Address, KnownOrigin, RelationshipRecord, Role};
use crate::utils::{ForensicsError, Result};

/// Record as stored on disk, before address validation
#[derive(Debug, Deserialize)]
struct RawRecord {
    grandparent: String,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    children: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawOrigin {
    address: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    kind: String,
}

/// Where an address sits in the flagged data
#[derive(Debug, Clone, Copy)]
pub struct RelationshipMatch<'a> {
    pub role: Role,
    pub record: Option<&'a RelationshipRecord>,
    /// For `Role::Child`, the parent whose children list holds the address
    pub via_parent: Option<&'a Address>,
}

impl RelationshipMatch<'_> {
    fn none() -> Self {
        Self {
            role: Role::None,
            record: None,
            via_parent: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Dataset {
    records: Vec<RelationshipRecord>,
    origins: HashMap<Address, KnownOrigin>,
    flagged: HashSet<Address>,
}

impl Dataset {
    pub fn new(records: Vec<RelationshipRecord>, origins: Vec<KnownOrigin>) -> Self {
        let flagged = records
            .iter()
            .flat_map(|record| record.addresses().cloned())
            .collect();
        let origins = origins
            .into_iter()
            .map(|origin| (origin.address.clone(), origin))
            .collect();

        Self { records, origins, flagged }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load both files. The flagged file is mandatory; a missing origins
    /// file only loses the labels.
    pub fn load(paths: &DatasetPaths) -> Result<Self> {
        let flagged_text = std::fs::read_to_string(&paths.flagged).map_err(|e| {
            ForensicsError::DatasetUnavailable(format!("{}: {}", paths.flagged.display(), e))
        })?;

        let origins_text = match std::fs::read_to_string(&paths.origins) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(
                    "Known origins unavailable ({}: {}), continuing without labels",
                    paths.origins.display(),
                    e
                );
                None
            }
        };

        Self::from_json(&flagged_text, origins_text.as_deref())
    }

    pub fn from_json(flagged: &str, origins: Option<&str>) -> Result<Self> {
        let records = parse_records(flagged)?;

        let origins = match origins {
            Some(text) => match parse_origins(text) {
                Ok(origins) => origins,
                Err(e) => {
                    tracing::warn!("Ignoring known origins: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let dataset = Self::new(records, origins);
        tracing::info!(
            "📚 Dataset loaded: {} relationship records, {} flagged addresses, {} known origins",
            dataset.record_count(),
            dataset.flagged.len(),
            dataset.origin_count()
        );
        Ok(dataset)
    }

    /// Highest-precedence role of `address` across every record
    pub fn find_relationship(&self, address: &Address) -> RelationshipMatch<'_> {
        let mut best = RelationshipMatch::none();

        for record in &self.records {
            if &record.grandparent == address {
                return RelationshipMatch {
                    role: Role::Grandparent,
                    record: Some(record),
                    via_parent: None,
                };
            }

            if best.role < Role::Parent && record.parents.contains(address) {
                best = RelationshipMatch {
                    role: Role::Parent,
                    record: Some(record),
                    via_parent: None,
                };
            } else if best.role < Role::Child {
                if let Some(parent) = record.parent_of(address) {
                    best = RelationshipMatch {
                        role: Role::Child,
                        record: Some(record),
                        via_parent: Some(parent),
                    };
                }
            }
        }

        best
    }

    pub fn find_known_origin(&self, address: &Address) -> Option<&KnownOrigin> {
        self.origins.get(address)
    }

    /// Every address named anywhere in any record
    pub fn flagged_addresses(&self) -> &HashSet<Address> {
        &self.flagged
    }

    pub fn is_flagged(&self, address: &Address) -> bool {
        self.flagged.contains(address)
    }

    pub fn records(&self) -> &[RelationshipRecord] {
        &self.records
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn origin_count(&self) -> usize {
        self.origins.len()
    }
}

fn parse_records(text: &str) -> Result<Vec<RelationshipRecord>> {
    let outcome: LoadOutcome<RawRecord> = load_entries(text, "flagged dataset")?;

    let mut records = Vec::with_capacity(outcome.entries.len());
    for raw in outcome.entries {
        let grandparent = match Address::clean(&raw.grandparent) {
            Ok(address) => address,
            Err(_) => {
                tracing::warn!("Skipping record with invalid grandparent '{}'", raw.grandparent);
                continue;
            }
        };

        let mut record = RelationshipRecord::new(grandparent);
        for parent in &raw.parents {
            match Address::clean(parent) {
                Ok(address) => {
                    record.parents.insert(address);
                }
                Err(_) => tracing::warn!("Dropping invalid parent '{}' under {}", parent, record.grandparent),
            }
        }
        for (parent, kids) in &raw.children {
            let parent = match Address::clean(parent) {
                Ok(address) => address,
                Err(_) => {
                    tracing::warn!("Dropping children of invalid parent '{}'", parent);
                    continue;
                }
            };
            let entry = record.children.entry(parent).or_default();
            for kid in kids {
                match Address::clean(kid) {
                    Ok(address) => {
                        entry.insert(address);
                    }
                    Err(_) => tracing::warn!("Dropping invalid child '{}'", kid),
                }
            }
        }

        records.push(record);
    }

    Ok(records)
}

fn parse_origins(text: &str) -> Result<Vec<KnownOrigin>> {
    let outcome: LoadOutcome<RawOrigin> = load_entries(text, "known origins")?;

    Ok(outcome
        .entries
        .into_iter()
        .filter_map(|raw| match Address::clean(&raw.address) {
            Ok(address) => Some(KnownOrigin {
                address,
                name: raw.name,
                kind: raw.kind,
            }),
            Err(_) => {
                tracing::warn!("Dropping known origin with invalid address '{}'", raw.address);
                None
            }
        })
        .collect())
}

/// Dataset as held by the engine: load failure stays distinguishable from
/// an empty dataset
#[derive(Debug, Clone)]
pub enum DatasetState {
    Ready(Arc<Dataset>),
    Unavailable(String),
}

impl DatasetState {
    /// Load, turning any failure into `Unavailable`
    pub fn load(paths: &DatasetPaths) -> Self {
        match Dataset::load(paths) {
            Ok(dataset) => DatasetState::Ready(Arc::new(dataset)),
            Err(e) => {
                tracing::error!("❌ Flagged dataset unavailable: {}", e);
                DatasetState::Unavailable(e.to_string())
            }
        }
    }

    pub fn from_path(flagged: &Path) -> Self {
        Self::load(&DatasetPaths {
            flagged: flagged.to_path_buf(),
            origins: DatasetPaths::default().origins,
        })
    }

    pub fn ready(&self) -> Result<&Arc<Dataset>> {
        match self {
            DatasetState::Ready(dataset) => Ok(dataset),
            DatasetState::Unavailable(reason) => Err(ForensicsError::DatasetUnavailable(reason.clone())),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, DatasetState::Ready(_))
    }
}

impl From<Dataset> for DatasetState {
    fn from(dataset: Dataset) -> Self {
        DatasetState::Ready(Arc::new(dataset))
    }
}
