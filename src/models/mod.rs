pub mod address;
pub mod transaction;
pub mod relationship;
pub mod risk;
pub mod tree;
pub mod metrics;
pub mod finding;
pub mod analysis;

pub use address::Address;
pub use transaction::{Transaction, TxKind, WEI_PER_GWEI, WEI_PER_UNIT};
pub use relationship::{KnownOrigin, RelationshipRecord, Role};
pub use risk::{Evidence, RelatedAddresses, RiskResult, RiskStatus};
pub use tree::{FamilyTree, TreeStats};
pub use metrics::{
    ActiveCounterparty, CapitalGainsEstimate, FinancialSummary, FraudRiskSummary, MetricsBundle,
    OpenLot, OpportunityScores, RiskScores, TrustScores, VolatilityScores,
};
pub use finding::{Category, Finding, Severity};
pub use analysis::{AddressReport, AnalysisResult};
