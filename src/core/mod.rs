pub mod traits;
pub mod engine;

pub use traits::{AddressTarget, Analyzer, TransactionSource};
pub use engine::{ForensicsEngine, OriginReport, OriginStatus};
