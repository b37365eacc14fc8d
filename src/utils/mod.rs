pub mod errors;

pub use errors::{ForensicsError, Result};
