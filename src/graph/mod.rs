pub mod builder;
pub mod visualize;

pub use builder::{BuildPhase, FamilyTreeBuilder};
pub use visualize::{GraphEdge, GraphNode, NodeRole, RiskGraph};
