use async_trait::async_trait;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use crate::blockchain::{retry::RetryPolicy, Chain};
use crate::config::ForensicsConfig;
use crate::core::TransactionSource;
use crate::models::{transaction::decimal_u256, Address, Transaction, TxKind};
use crate::utils::{ForensicsError, Result};

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const NO_TRANSACTIONS: &str = "No transactions found";

/// Block-explorer client speaking the Etherscan V2 multichain API
pub struct ExplorerClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    limiter: Arc<DirectLimiter>,
    retry: RetryPolicy,
}

/// Envelope returned by every `module=account` action
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

/// Raw record shared by txlist, txlistinternal and tokentx
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTx {
    hash: String,
    #[serde(default)]
    from: String,
    #[serde(default)]
    to: String,
    #[serde(default, with = "decimal_u256")]
    value: ethers::types::U256,
    #[serde(default, with = "decimal_u256")]
    gas_price: ethers::types::U256,
    #[serde(default)]
    time_stamp: String,
    #[serde(default)]
    is_error: String,
    #[serde(default)]
    token_symbol: Option<String>,
}

impl ExplorerClient {
    pub fn new(config: &ForensicsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.explorer.timeout())
            .build()?;

        let rps = NonZeroU32::new(config.explorer.requests_per_second).ok_or_else(|| {
            ForensicsError::ConfigError("requests_per_second must be > 0".into())
        })?;
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));

        if config.explorer.api_key.is_empty() {
            tracing::warn!("No explorer API key configured; requests may be throttled");
        }

        Ok(Self {
            http,
            base_url: config.explorer.base_url.clone(),
            api_key: config.explorer.api_key.clone(),
            limiter,
            retry: RetryPolicy::from_config(&config.retry, &config.explorer),
        })
    }

    fn action(kind: TxKind) -> &'static str {
        match kind {
            TxKind::Regular => "txlist",
            TxKind::Internal => "txlistinternal",
            TxKind::TokenTransfer => "tokentx",
        }
    }

    async fn fetch_kind(&self, address: &Address, chain: Chain, kind: TxKind) -> Result<Vec<Transaction>> {
        let label = format!("{} {} on {}", Self::action(kind), address.shorten(6), chain);

        let records = self
            .retry
            .run(&label, || self.request(address, chain, kind))
            .await?;

        let total = records.len();
        let transactions: Vec<Transaction> = records
            .into_iter()
            .filter_map(|raw| normalize(raw, chain, kind))
            .collect();

        if transactions.len() < total {
            tracing::debug!(
                "Dropped {} {} records with invalid from/to",
                total - transactions.len(),
                Self::action(kind)
            );
        }

        Ok(transactions)
    }

    async fn request(&self, address: &Address, chain: Chain, kind: TxKind) -> Result<Vec<RawTx>> {
        self.limiter.until_ready().await;

        let chain_id = chain.chain_id().to_string();
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("chainid", chain_id.as_str()),
                ("module", "account"),
                ("action", Self::action(kind)),
                ("address", address.as_str()),
                ("startblock", "0"),
                ("endblock", "99999999"),
                ("sort", "asc"),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(ForensicsError::UpstreamStatus {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let body: ExplorerResponse = response.json().await?;
        parse_response(body)
    }
}

fn parse_response(body: ExplorerResponse) -> Result<Vec<RawTx>> {
    if body.status == "1" {
        return Ok(serde_json::from_value(body.result)?);
    }

    let detail = match &body.result {
        serde_json::Value::String(s) => s.clone(),
        _ => String::new(),
    };

    if body.message.contains(NO_TRANSACTIONS) || detail.contains(NO_TRANSACTIONS) {
        return Ok(Vec::new());
    }

    if detail.to_lowercase().contains("rate limit") {
        return Err(ForensicsError::RateLimited(detail));
    }

    Err(ForensicsError::ExplorerError(format!("{}: {}", body.message, detail)))
}

fn normalize(raw: RawTx, chain: Chain, kind: TxKind) -> Option<Transaction> {
    let from = Address::parse(&raw.from).ok()?;
    let to = Address::parse(&raw.to).ok()?;

    let mut tx = Transaction::new(raw.hash, from, to, raw.value, chain, kind)
        .with_gas_price(raw.gas_price)
        .with_timestamp(raw.time_stamp.parse().unwrap_or(0));

    if let Some(symbol) = raw.token_symbol.filter(|s| !s.is_empty()) {
        tx = tx.with_token_symbol(symbol);
    }
    if raw.is_error == "1" {
        tx = tx.failed();
    }

    Some(tx)
}

#[async_trait]
impl TransactionSource for ExplorerClient {
    fn name(&self) -> &'static str {
        "explorer"
    }

    async fn fetch_transactions(
        &self,
        address: &Address,
        chain: Chain,
        kinds: &[TxKind],
    ) -> Result<Vec<Transaction>> {
        let mut transactions = Vec::new();
        for &kind in kinds {
            transactions.extend(self.fetch_kind(address, chain, kind).await?);
        }

        tracing::debug!(
            "Fetched {} transactions for {} on {}",
            transactions.len(),
            address.shorten(6),
            chain
        );
        Ok(transactions)
    }
}
