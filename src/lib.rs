pub mod analyzers;
pub mod blockchain;
pub mod config;
pub mod core;
pub mod dataset;
pub mod graph;
pub mod metrics;
pub mod models;
pub mod utils;

pub use config::ForensicsConfig;
pub use core::{AddressTarget, Analyzer, ForensicsEngine, OriginReport, OriginStatus, TransactionSource};
pub use dataset::{Dataset, DatasetState};
pub use models::{
    Address, AddressReport, Category, FamilyTree, Finding, MetricsBundle, RiskResult, RiskStatus,
    Severity, Transaction, TxKind,
};
pub use utils::{ForensicsError, Result};
