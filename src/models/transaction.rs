use ethers::types::U256;
use serde::{Deserialize, Serialize};
use super::address::Address;
use crate::blockchain::Chain;

/// Wei per whole native unit (ETH, BNB, MATIC, ...)
pub const WEI_PER_UNIT: u64 = 1_000_000_000_000_000_000;

/// Wei per gwei
pub const WEI_PER_GWEI: u64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TxKind {
    Regular,
    Internal,
    TokenTransfer,
}

impl TxKind {
    pub const ALL: [TxKind; 3] = [TxKind::Regular, TxKind::Internal, TxKind::TokenTransfer];

    /// Native-value transfers; token transfers carry token base units instead
    pub fn is_native(&self) -> bool {
        !matches!(self, TxKind::TokenTransfer)
    }
}

/// One on-chain event touching an address.
///
/// `value_wei` is the raw base-unit amount (wei for native transfers, token
/// base units for `TokenTransfer`). It is never converted to floating point
/// before aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub from: Address,
    pub to: Address,
    #[serde(with = "decimal_u256")]
    pub value_wei: U256,
    #[serde(with = "decimal_u256", default)]
    pub gas_price: U256,
    pub timestamp: u64,
    pub chain: Chain,
    pub kind: TxKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    #[serde(default)]
    pub is_error: bool,
}

impl Transaction {
    pub fn new(
        hash: impl Into<String>,
        from: Address,
        to: Address,
        value_wei: U256,
        chain: Chain,
        kind: TxKind,
    ) -> Self {
        Self {
            hash: hash.into(),
            from,
            to,
            value_wei,
            gas_price: U256::zero(),
            timestamp: 0,
            chain,
            kind,
            token_symbol: None,
            is_error: false,
        }
    }

    pub fn with_gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_token_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.token_symbol = Some(symbol.into());
        self
    }

    pub fn failed(mut self) -> Self {
        self.is_error = true;
        self
    }

    /// The other side of the transfer, if `address` is one of the two parties
    pub fn counterparty(&self, address: &Address) -> Option<&Address> {
        if &self.from == address {
            Some(&self.to)
        } else if &self.to == address {
            Some(&self.from)
        } else {
            None
        }
    }

    pub fn touches(&self, address: &Address) -> bool {
        &self.from == address || &self.to == address
    }

    pub fn explorer_url(&self) -> String {
        self.chain.tx_url(&self.hash)
    }
}

/// Convert base units to whole units for display and score inputs
pub fn wei_to_units(value: U256) -> f64 {
    u256_to_f64(value) / WEI_PER_UNIT as f64
}

pub fn wei_to_gwei(value: U256) -> f64 {
    u256_to_f64(value) / WEI_PER_GWEI as f64
}

/// Convert whole units to wei; fractional digits beyond 18 are truncated
pub fn units_to_wei(units: f64) -> U256 {
    if !units.is_finite() || units <= 0.0 {
        return U256::zero();
    }
    let whole = units.trunc();
    let frac = units - whole;
    let whole_wei = U256::from(whole as u128) * U256::from(WEI_PER_UNIT);
    let frac_wei = U256::from((frac * WEI_PER_UNIT as f64).round() as u128);
    whole_wei + frac_wei
}

fn u256_to_f64(value: U256) -> f64 {
    value
        .0
        .iter()
        .rev()
        .fold(0.0, |acc, limb| acc * 18_446_744_073_709_551_616.0 + *limb as f64)
}

/// Serialize `U256` as a decimal string, the way explorers report amounts
pub mod decimal_u256 {
    use ethers::types::U256;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) if text.is_empty() => Ok(U256::zero()),
            Raw::Text(text) if text.starts_with("0x") => {
                U256::from_str_radix(&text[2..], 16).map_err(D::Error::custom)
            }
            Raw::Text(text) => U256::from_dec_str(&text).map_err(D::Error::custom),
            Raw::Number(n) => Ok(U256::from(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::parse(&format!("0x{:040x}", n)).unwrap()
    }

    #[test]
    fn test_unit_conversion() {
        assert_eq!(wei_to_units(U256::from(WEI_PER_UNIT)), 1.0);
        assert_eq!(wei_to_gwei(U256::from(25 * WEI_PER_GWEI)), 25.0);
        assert_eq!(units_to_wei(0.0001), U256::from(100_000_000_000_000u64));
        assert_eq!(units_to_wei(2.0), U256::from(2 * WEI_PER_UNIT));
        assert_eq!(units_to_wei(-1.0), U256::zero());
    }

    #[test]
    fn test_large_values_convert_without_overflow() {
        let huge = U256::from(WEI_PER_UNIT) * U256::from(u64::MAX);
        let units = wei_to_units(huge);
        assert!((units - u64::MAX as f64).abs() / (u64::MAX as f64) < 1e-9);
    }

    #[test]
    fn test_counterparty() {
        let tx = Transaction::new("0x1", addr(1), addr(2), U256::one(), Chain::Ethereum, TxKind::Regular);
        assert_eq!(tx.counterparty(&addr(1)), Some(&addr(2)));
        assert_eq!(tx.counterparty(&addr(2)), Some(&addr(1)));
        assert_eq!(tx.counterparty(&addr(3)), None);
    }

    #[test]
    fn test_serde_decimal_amounts() {
        let json = serde_json::json!({
            "hash": "0xabc",
            "from": "0x0000000000000000000000000000000000000001",
            "to": "0x0000000000000000000000000000000000000002",
            "valueWei": "123456789012345678901234567890",
            "gasPrice": "20000000000",
            "timestamp": 1700000000,
            "chain": "ethereum",
            "kind": "Regular"
        });
        let tx: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(tx.value_wei, U256::from_dec_str("123456789012345678901234567890").unwrap());
        assert!(!tx.is_error);

        let back = serde_json::to_value(&tx).unwrap();
        assert_eq!(back["valueWei"], "123456789012345678901234567890");
    }
}
