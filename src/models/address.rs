//! Canonical EVM address
//!
//! Every address entering the crate goes through [`Address::parse`], which
//! enforces the `0x` + 40 hex character format and lower-cases the result.
//! Equality and hashing are therefore plain string comparisons.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::utils::{ForensicsError, Result};

const HEX_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Validate and canonicalize a candidate address
    pub fn parse(candidate: &str) -> Result<Self> {
        let trimmed = candidate.trim();

        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| ForensicsError::InvalidAddress(candidate.to_string()))?;

        if hex_part.len() != HEX_LEN || hex::decode(hex_part).is_err() {
            return Err(ForensicsError::InvalidAddress(candidate.to_string()));
        }

        Ok(Self(format!("0x{}", hex_part.to_lowercase())))
    }

    /// Strip stray punctuation (quotes, commas, whitespace) from pasted input
    /// before validating it.
    pub fn clean(candidate: &str) -> Result<Self> {
        let cleaned: String = candidate
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        Self::parse(&cleaned)
            .map_err(|_| ForensicsError::InvalidAddress(candidate.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `0xabcdef...123456` style label for graphs and terminal output
    pub fn shorten(&self, length: usize) -> String {
        if self.0.len() > 2 * length {
            format!("{}...{}", &self.0[..length], &self.0[self.0.len() - length..])
        } else {
            self.0.clone()
        }
    }
}

/// Validate a candidate without raising: malformed input is reported back
/// to the caller as the original string.
pub fn validate(candidate: &str) -> std::result::Result<Address, String> {
    Address::parse(candidate).map_err(|_| {
        tracing::debug!("Rejected malformed address candidate {:?}", candidate);
        candidate.to_string()
    })
}

impl FromStr for Address {
    type Err = ForensicsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = ForensicsError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lowercases() {
        let addr = Address::parse("0xA1077a294dDE1B09bB078844df40758a5D0f9a27").unwrap();
        assert_eq!(addr.as_str(), "0xa1077a294dde1b09bb078844df40758a5d0f9a27");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(Address::parse("0x1234").is_err());
        assert!(Address::parse("a1077a294dde1b09bb078844df40758a5d0f9a27").is_err());
        assert!(Address::parse("0xZZ077a294dde1b09bb078844df40758a5d0f9a27").is_err());
        assert!(Address::parse("0xa1077a294dde1b09bb078844df40758a5d0f9a2700").is_err());
        assert!(Address::parse("").is_err());
    }

    #[test]
    fn test_clean_strips_punctuation() {
        let addr = Address::clean("\"0xA1077a294dDE1B09bB078844df40758a5D0f9a27\",").unwrap();
        assert_eq!(addr.as_str(), "0xa1077a294dde1b09bb078844df40758a5d0f9a27");
    }

    #[test]
    fn test_validate_reports_candidate() {
        assert_eq!(validate("not-an-address"), Err("not-an-address".to_string()));
        assert!(validate("0x0000000000000000000000000000000000000001").is_ok());
    }

    #[test]
    fn test_serde_enforces_format() {
        let ok: Address = serde_json::from_str("\"0xA1077a294dDE1B09bB078844df40758a5D0f9a27\"").unwrap();
        assert_eq!(ok.as_str(), "0xa1077a294dde1b09bb078844df40758a5d0f9a27");
        assert!(serde_json::from_str::<Address>("\"0xnope\"").is_err());
    }

    #[test]
    fn test_shorten() {
        let addr = Address::parse("0xa1077a294dde1b09bb078844df40758a5d0f9a27").unwrap();
        assert_eq!(addr.shorten(6), "0xa107...0f9a27");
    }
}
