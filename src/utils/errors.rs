use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForensicsError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    #[error("Explorer rate limit hit: {0}")]
    RateLimited(String),

    #[error("Explorer API error: {0}")]
    ExplorerError(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Upstream unavailable after {attempts} attempts: {reason}")]
    UpstreamUnavailable { attempts: u32, reason: String },

    #[error("Dataset unavailable: {0}")]
    DatasetUnavailable(String),

    #[error("Classification failed: {0}")]
    ClassificationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ForensicsError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ForensicsError::UpstreamStatus { status, .. } => *status == 429 || *status >= 500,
            ForensicsError::RateLimited(_) | ForensicsError::Timeout(_) => true,
            ForensicsError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ForensicsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let throttled = ForensicsError::UpstreamStatus { status: 429, message: "slow down".into() };
        let outage = ForensicsError::UpstreamStatus { status: 503, message: "unavailable".into() };
        let bad_request = ForensicsError::UpstreamStatus { status: 400, message: "bad".into() };

        assert!(throttled.is_transient());
        assert!(outage.is_transient());
        assert!(!bad_request.is_transient());
        assert!(ForensicsError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(!ForensicsError::ExplorerError("Invalid API Key".into()).is_transient());
        assert!(!ForensicsError::InvalidAddress("0x1".into()).is_transient());
    }
}
