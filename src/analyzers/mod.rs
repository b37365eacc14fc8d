pub mod classifier;
pub mod counterparty;
pub mod dusting;
pub mod heuristic;

pub use classifier::{evidence_from, EvidenceCollector, RiskClassifier};
pub use counterparty::CounterpartyAnalyzer;
pub use dusting::{DustingAnalyzer, DustingPattern};
pub use heuristic::HeuristicAnalyzer;
