//! Runtime configuration
//!
//! Defaults cover a working setup except for the explorer API key. A JSON
//! file can override any subset of fields, and a handful of environment
//! variables override the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use crate::blockchain::chains::{Chain, DEFAULT_CHAINS};
use crate::utils::{ForensicsError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForensicsConfig {
    pub explorer: ExplorerConfig,
    pub retry: RetryConfig,
    pub chains: Vec<Chain>,
    pub dataset: DatasetPaths,
    pub graph: GraphConfig,
    pub scoring: ScoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub requests_per_second: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetPaths {
    pub flagged: PathBuf,
    pub origins: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Cap on parents expanded per root; `None` expands all of them
    pub max_parents: Option<usize>,
    /// Parent fetches in flight at once
    pub concurrency: usize,
}

/// Thresholds and scaling factors for the heuristic scores.
///
/// Amounts are in whole native units; they are converted to wei before
/// any comparison against transaction values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub high_value_threshold: f64,
    pub targeted_attack_weight: f64,
    pub dust_threshold: f64,
    pub dusting_weight: f64,
    pub draining_divisor: f64,
    pub phishing_weight: f64,
    pub investment_divisor: f64,
    pub staking_weight: f64,
    pub tax_efficiency_weight: f64,
    pub trust_weight: f64,
    pub wallet_trust_divisor: f64,
    pub activity_value_divisor: f64,
    pub dust_monitor_threshold: f64,
    pub assumed_purchase_price: f64,
    pub assumed_sale_price: f64,
    pub tax_rate: f64,
    pub fraud_low_min_interactions: usize,
    pub fraud_moderate_min_interactions: usize,
}

impl Default for ForensicsConfig {
    fn default() -> Self {
        Self {
            explorer: ExplorerConfig::default(),
            retry: RetryConfig::default(),
            chains: DEFAULT_CHAINS.to_vec(),
            dataset: DatasetPaths::default(),
            graph: GraphConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.etherscan.io/v2/api".to_string(),
            api_key: String::new(),
            timeout_ms: 10_000,
            requests_per_second: 5,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 250,
            max_delay_ms: 5_000,
        }
    }
}

impl Default for DatasetPaths {
    fn default() -> Self {
        Self {
            flagged: PathBuf::from("data/flagged.json"),
            origins: PathBuf::from("data/contract_origins.json"),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_parents: None,
            concurrency: 8,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            high_value_threshold: 1.0,
            targeted_attack_weight: 5.0,
            dust_threshold: 0.0001,
            dusting_weight: 10.0,
            draining_divisor: 100.0,
            phishing_weight: 10.0,
            investment_divisor: 1000.0,
            staking_weight: 2.0,
            tax_efficiency_weight: 2.0,
            trust_weight: 2.0,
            wallet_trust_divisor: 10.0,
            activity_value_divisor: 10.0,
            dust_monitor_threshold: 0.001,
            assumed_purchase_price: 2000.0,
            assumed_sale_price: 3000.0,
            tax_rate: 0.25,
            fraud_low_min_interactions: 100,
            fraud_moderate_min_interactions: 20,
        }
    }
}

impl ExplorerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ForensicsConfig {
    /// Load from an optional JSON file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                serde_json::from_str(&text).map_err(|e| {
                    ForensicsError::ConfigError(format!("{}: {}", path.display(), e))
                })?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("ETHERSCAN_API_KEY") {
            self.explorer.api_key = key;
        }
        if let Some(url) = lookup("FORENSICS_EXPLORER_URL") {
            self.explorer.base_url = url;
        }
        if let Some(list) = lookup("FORENSICS_CHAINS") {
            let chains: Vec<Chain> = list
                .split(',')
                .filter(|name| !name.trim().is_empty())
                .filter_map(|name| {
                    let chain = Chain::resolve(name);
                    if chain.is_none() {
                        tracing::warn!("Ignoring unsupported chain '{}' in FORENSICS_CHAINS", name.trim());
                    }
                    chain
                })
                .collect();
            if !chains.is_empty() {
                self.chains = chains;
            }
        }
        if let Some(path) = lookup("FORENSICS_FLAGGED_PATH") {
            self.dataset.flagged = PathBuf::from(path);
        }
        if let Some(path) = lookup("FORENSICS_ORIGINS_PATH") {
            self.dataset.origins = PathBuf::from(path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chains.is_empty() {
            return Err(ForensicsError::ConfigError("at least one chain is required".into()));
        }
        if self.explorer.requests_per_second == 0 {
            return Err(ForensicsError::ConfigError("requests_per_second must be > 0".into()));
        }
        if self.graph.concurrency == 0 {
            return Err(ForensicsError::ConfigError("graph concurrency must be > 0".into()));
        }
        if self.scoring.dust_threshold <= 0.0 || self.scoring.high_value_threshold <= 0.0 {
            return Err(ForensicsError::ConfigError("score thresholds must be positive".into()));
        }
        Ok(())
    }
}
