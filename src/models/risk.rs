use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use super::address::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskStatus {
    Pass,
    Warning,
    Fail,
    Error,
}

impl RiskStatus {
    pub fn emoji(&self) -> &'static str {
        match self {
            RiskStatus::Pass => "🟢",
            RiskStatus::Warning => "🟠",
            RiskStatus::Fail => "🔴",
            RiskStatus::Error => "⚪",
        }
    }

    /// Node colour used by graph exports
    pub fn color(&self) -> &'static str {
        match self {
            RiskStatus::Pass => "green",
            RiskStatus::Warning => "orange",
            RiskStatus::Fail => "red",
            RiskStatus::Error => "gray",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskStatus::Pass => "PASS",
            RiskStatus::Warning => "WARNING",
            RiskStatus::Fail => "FAIL",
            RiskStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for RiskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dataset neighbourhood of a flagged address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedAddresses {
    pub grandparent: Address,
    pub parents: BTreeSet<Address>,
    pub children: BTreeSet<Address>,
}

/// Supporting on-chain evidence attached to FAIL/WARNING verdicts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub transaction_type: String,
    pub transaction_hash: String,
    pub from: Address,
    pub to: Address,
    pub explorer_url: String,
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Involved in {} transaction", self.transaction_type)?;
        writeln!(f, "From: {} To: {}", self.from, self.to)?;
        writeln!(f, "Transaction Hash: {}", self.transaction_hash)?;
        write!(f, "Explorer URL: {}", self.explorer_url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskResult {
    /// The address as supplied by the caller (canonical form when valid)
    pub address: String,
    pub status: RiskStatus,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_addresses: Option<RelatedAddresses>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,
}

impl RiskResult {
    pub fn new(address: impl Into<String>, status: RiskStatus, description: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            status,
            description: description.into(),
            related_addresses: None,
            evidence: Vec::new(),
        }
    }

    pub fn error(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(address, RiskStatus::Error, message)
    }

    pub fn with_related(mut self, related: RelatedAddresses) -> Self {
        self.related_addresses = Some(related);
        self
    }

    pub fn is_flagged(&self) -> bool {
        matches!(self.status, RiskStatus::Fail | RiskStatus::Warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&RiskStatus::Warning).unwrap(), "\"WARNING\"");
        let status: RiskStatus = serde_json::from_str("\"FAIL\"").unwrap();
        assert_eq!(status, RiskStatus::Fail);
    }

    #[test]
    fn test_result_omits_empty_fields() {
        let result = RiskResult::new("0xabc", RiskStatus::Pass, "clean");
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("relatedAddresses").is_none());
        assert!(json.get("evidence").is_none());
        assert!(!result.is_flagged());
    }
}
