//! FIFO capital gains approximation
//!
//! Incoming native transfers open purchase lots and outgoing transfers close
//! them oldest first. Prices are fixed assumptions from [`ScoringConfig`], so
//! the result is an estimate of how FIFO matching plays out, not a valuation
//! against market prices.

use ethers::types::U256;
use std::collections::VecDeque;
use crate::config::ScoringConfig;
use crate::models::{transaction::wei_to_units, Address, CapitalGainsEstimate, OpenLot, Transaction};

/// Part of a sale matched against one purchase lot
#[derive(Debug, Clone, PartialEq)]
pub struct LotMatch {
    pub amount_wei: U256,
    pub purchase_price: f64,
    pub sale_price: f64,
}

impl LotMatch {
    pub fn gain(&self) -> f64 {
        (self.sale_price - self.purchase_price) * wei_to_units(self.amount_wei)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FifoLedger {
    lots: VecDeque<OpenLot>,
    realized_gain: f64,
    unmatched_sale_wei: U256,
}

impl FifoLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buy(&mut self, amount_wei: U256, price: f64) {
        if !amount_wei.is_zero() {
            self.lots.push_back(OpenLot { amount_wei, price });
        }
    }

    /// Close lots oldest first; a lot larger than the remaining sale is
    /// consumed partially and stays at the front.
    pub fn sell(&mut self, amount_wei: U256, price: f64) -> Vec<LotMatch> {
        let mut remaining = amount_wei;
        let mut matches = Vec::new();

        while !remaining.is_zero() {
            let Some(lot) = self.lots.front_mut() else {
                break;
            };

            let matched = remaining.min(lot.amount_wei);
            matches.push(LotMatch {
                amount_wei: matched,
                purchase_price: lot.price,
                sale_price: price,
            });

            lot.amount_wei -= matched;
            remaining -= matched;
            if lot.amount_wei.is_zero() {
                self.lots.pop_front();
            }
        }

        self.unmatched_sale_wei = self.unmatched_sale_wei.saturating_add(remaining);
        self.realized_gain += matches.iter().map(LotMatch::gain).sum::<f64>();
        matches
    }

    pub fn open_lots(&self) -> impl Iterator<Item = &OpenLot> {
        self.lots.iter()
    }

    pub fn realized_gain(&self) -> f64 {
        self.realized_gain
    }

    pub fn into_estimate(self, tax_rate: f64) -> CapitalGainsEstimate {
        CapitalGainsEstimate {
            realized_gain: self.realized_gain,
            estimated_tax: self.realized_gain.max(0.0) * tax_rate,
            open_lots: self.lots.into_iter().collect(),
            unmatched_sale_wei: self.unmatched_sale_wei,
        }
    }
}

/// Replay native transfers in time order through a [`FifoLedger`]
pub fn estimate_capital_gains(
    transactions: &[Transaction],
    address: &Address,
    cfg: &ScoringConfig,
) -> CapitalGainsEstimate {
    let mut ordered: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.kind.is_native() && !tx.is_error && tx.from != tx.to)
        .collect();
    ordered.sort_by_key(|tx| tx.timestamp);

    let mut ledger = FifoLedger::new();
    for tx in ordered {
        if &tx.to == address {
            ledger.buy(tx.value_wei, cfg.assumed_purchase_price);
        } else if &tx.from == address {
            ledger.sell(tx.value_wei, cfg.assumed_sale_price);
        }
    }

    ledger.into_estimate(cfg.tax_rate)
}
