//! Supported EVM chains
//!
//! Explorer calls go through the unified V2 endpoint keyed by chain id, so the
//! table only needs the id, a web explorer for transaction links, and the
//! layer used by the activity breakdown.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use crate::utils::ForensicsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    Ethereum,
    Sepolia,
    Holesky,
    Bsc,
    BscTestnet,
    Polygon,
    PolygonZkevm,
    Base,
    Arbitrum,
    ArbitrumNova,
    Linea,
    Fantom,
    Optimism,
    Avalanche,
    Blast,
    Scroll,
    Gnosis,
    Celo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    L1,
    L2,
}

/// Chains queried when the caller doesn't name one
pub const DEFAULT_CHAINS: &[Chain] = &[
    Chain::Ethereum,
    Chain::Base,
    Chain::Bsc,
    Chain::Polygon,
    Chain::Arbitrum,
    Chain::Optimism,
];

static ALIASES: Lazy<HashMap<&'static str, Chain>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for chain in Chain::all() {
        map.insert(chain.name(), *chain);
    }
    map.insert("eth", Chain::Ethereum);
    map.insert("mainnet", Chain::Ethereum);
    map.insert("bnb", Chain::Bsc);
    map.insert("matic", Chain::Polygon);
    map.insert("zkevm_polygon", Chain::PolygonZkevm);
    map.insert("arb", Chain::Arbitrum);
    map.insert("nova_arbitrum", Chain::ArbitrumNova);
    map.insert("ftm", Chain::Fantom);
    map.insert("op", Chain::Optimism);
    map.insert("avax", Chain::Avalanche);
    map.insert("snow", Chain::Avalanche);
    map
});

impl Chain {
    pub fn all() -> &'static [Chain] {
        &[
            Chain::Ethereum,
            Chain::Sepolia,
            Chain::Holesky,
            Chain::Bsc,
            Chain::BscTestnet,
            Chain::Polygon,
            Chain::PolygonZkevm,
            Chain::Base,
            Chain::Arbitrum,
            Chain::ArbitrumNova,
            Chain::Linea,
            Chain::Fantom,
            Chain::Optimism,
            Chain::Avalanche,
            Chain::Blast,
            Chain::Scroll,
            Chain::Gnosis,
            Chain::Celo,
        ]
    }

    /// Look up a chain by name or common alias, case-insensitively
    pub fn resolve(name: &str) -> Option<Chain> {
        ALIASES.get(name.trim().to_lowercase().as_str()).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Sepolia => "sepolia",
            Chain::Holesky => "holesky",
            Chain::Bsc => "bsc",
            Chain::BscTestnet => "bsc_testnet",
            Chain::Polygon => "polygon",
            Chain::PolygonZkevm => "polygon_zkevm",
            Chain::Base => "base",
            Chain::Arbitrum => "arbitrum",
            Chain::ArbitrumNova => "arbitrum_nova",
            Chain::Linea => "linea",
            Chain::Fantom => "fantom",
            Chain::Optimism => "optimism",
            Chain::Avalanche => "avalanche",
            Chain::Blast => "blast",
            Chain::Scroll => "scroll",
            Chain::Gnosis => "gnosis",
            Chain::Celo => "celo",
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::Sepolia => 11155111,
            Chain::Holesky => 17000,
            Chain::Bsc => 56,
            Chain::BscTestnet => 97,
            Chain::Polygon => 137,
            Chain::PolygonZkevm => 1101,
            Chain::Base => 8453,
            Chain::Arbitrum => 42161,
            Chain::ArbitrumNova => 42170,
            Chain::Linea => 59144,
            Chain::Fantom => 250,
            Chain::Optimism => 10,
            Chain::Avalanche => 43114,
            Chain::Blast => 81457,
            Chain::Scroll => 534352,
            Chain::Gnosis => 100,
            Chain::Celo => 42220,
        }
    }

    /// Web explorer root used for transaction links
    pub fn explorer_url(&self) -> &'static str {
        match self {
            Chain::Ethereum => "https://etherscan.io",
            Chain::Sepolia => "https://sepolia.etherscan.io",
            Chain::Holesky => "https://holesky.etherscan.io",
            Chain::Bsc => "https://bscscan.com",
            Chain::BscTestnet => "https://testnet.bscscan.com",
            Chain::Polygon => "https://polygonscan.com",
            Chain::PolygonZkevm => "https://zkevm.polygonscan.com",
            Chain::Base => "https://basescan.org",
            Chain::Arbitrum => "https://arbiscan.io",
            Chain::ArbitrumNova => "https://nova.arbiscan.io",
            Chain::Linea => "https://lineascan.build",
            Chain::Fantom => "https://ftmscan.com",
            Chain::Optimism => "https://optimistic.etherscan.io",
            Chain::Avalanche => "https://snowtrace.io",
            Chain::Blast => "https://blastscan.io",
            Chain::Scroll => "https://scrollscan.com",
            Chain::Gnosis => "https://gnosisscan.io",
            Chain::Celo => "https://celoscan.io",
        }
    }

    pub fn layer(&self) -> Layer {
        match self {
            Chain::PolygonZkevm
            | Chain::Base
            | Chain::Blast
            | Chain::Arbitrum
            | Chain::ArbitrumNova
            | Chain::Linea
            | Chain::Optimism
            | Chain::Scroll => Layer::L2,
            _ => Layer::L1,
        }
    }

    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url(), hash)
    }
}

impl FromStr for Chain {
    type Err = ForensicsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Chain::resolve(s).ok_or_else(|| ForensicsError::UnsupportedChain(s.to_string()))
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_names_and_aliases() {
        assert_eq!(Chain::resolve("Ethereum"), Some(Chain::Ethereum));
        assert_eq!(Chain::resolve("matic"), Some(Chain::Polygon));
        assert_eq!(Chain::resolve(" op "), Some(Chain::Optimism));
        assert_eq!(Chain::resolve("dogechain"), None);
        assert!("dogechain".parse::<Chain>().is_err());
    }

    #[test]
    fn test_every_chain_resolves_by_name() {
        for chain in Chain::all() {
            assert_eq!(Chain::resolve(chain.name()), Some(*chain));
        }
    }

    #[test]
    fn test_layers() {
        assert_eq!(Chain::Ethereum.layer(), Layer::L1);
        assert_eq!(Chain::Arbitrum.layer(), Layer::L2);
        assert_eq!(Chain::Base.layer(), Layer::L2);
        assert_eq!(Chain::Bsc.layer(), Layer::L1);
    }

    #[test]
    fn test_tx_url() {
        assert_eq!(Chain::Ethereum.tx_url("0xabc"), "https://etherscan.io/tx/0xabc");
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        assert_eq!(serde_json::to_string(&Chain::PolygonZkevm).unwrap(), "\"polygon_zkevm\"");
        let chain: Chain = serde_json::from_str("\"arbitrum_nova\"").unwrap();
        assert_eq!(chain, Chain::ArbitrumNova);
    }
}
