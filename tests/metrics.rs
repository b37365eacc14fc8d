use ethers::types::U256;
use std::sync::Arc;
use wallet_forensics::blockchain::{Chain, SnapshotSource};
use wallet_forensics::config::ScoringConfig;
use wallet_forensics::metrics::{self, FifoLedger};
use wallet_forensics::models::transaction::units_to_wei;
use wallet_forensics::models::{RelationshipRecord, WEI_PER_UNIT};
use wallet_forensics::{
    Address, Dataset, ForensicsConfig, ForensicsEngine, RiskStatus, Severity, Transaction, TxKind,
};

fn addr(n: u8) -> Address {
    Address::parse(&format!("0x{:040x}", n)).unwrap()
}

fn units(n: u64) -> U256 {
    U256::from(n) * U256::from(WEI_PER_UNIT)
}

fn transfer(hash: &str, from: u8, to: u8, value: U256, timestamp: u64) -> Transaction {
    Transaction::new(hash, addr(from), addr(to), value, Chain::Ethereum, TxKind::Regular)
        .with_timestamp(timestamp)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn engine(source: SnapshotSource, dataset: Dataset) -> ForensicsEngine {
    ForensicsEngine::new(Arc::new(source), dataset.into(), ForensicsConfig::default())
}

#[test]
fn test_dust_scenario() {
    let me = addr(1);
    let txs: Vec<Transaction> = [0.00005, 0.5, 0.00002]
        .iter()
        .enumerate()
        .map(|(i, v)| transfer(&format!("0x{}", i), 2, 1, units_to_wei(*v), i as u64))
        .collect();

    assert_eq!(metrics::count_dust(&txs, 0.0001), 2);

    let bundle = metrics::compute_metrics(&me, &txs, &ScoringConfig::default());
    assert!(close(bundle.risk_scores.dusting, 20.0));
}

#[test]
fn test_empty_history() {
    let me = addr(1);
    assert_eq!(metrics::average_gas_price(&[]), U256::zero());

    let totals = metrics::totals_by_side(&[], &me);
    assert_eq!(totals.sent_wei, U256::zero());
    assert_eq!(totals.received_wei, U256::zero());

    let bundle = metrics::compute_metrics(&me, &[], &ScoringConfig::default());
    assert_eq!(bundle.transaction_count, 0);
    assert_eq!(bundle.avg_gas_price_gwei, 0.0);
    assert_eq!(bundle.activity_score, 0.0);
    assert!(bundle.volatility_scores.by_coin.is_finite());
    assert!(bundle.volatility_scores.by_wallet.is_finite());
    assert!(bundle.capital_gains.open_lots.is_empty());
}

#[test]
fn test_totals_are_exact_over_many_large_values() {
    let me = addr(1);
    // 1 unit plus 1 wei: the extra wei is lost by any f64 accumulation
    let value = U256::from(WEI_PER_UNIT) + U256::one();
    let txs: Vec<Transaction> = (0..1000u64)
        .map(|i| transfer(&format!("0x{:x}", i), 2, 1, value, i))
        .collect();

    let totals = metrics::totals_by_side(&txs, &me);
    assert_eq!(totals.received_wei, value * U256::from(1000u64));
    assert_eq!(totals.sent_wei, U256::zero());

    let json = serde_json::to_value(metrics::compute_metrics(&me, &txs, &ScoringConfig::default())).unwrap();
    assert_eq!(json["ethReceivedWei"], "1000000000000000001000");
}

#[test]
fn test_token_transfers_stay_out_of_native_totals() {
    let me = addr(1);
    let txs = vec![
        transfer("0x1", 2, 1, units(1), 1),
        Transaction::new("0x2", addr(3), me.clone(), units(500), Chain::Ethereum, TxKind::TokenTransfer)
            .with_token_symbol("USDC"),
        Transaction::new("0x3", me.clone(), addr(3), units(7), Chain::Ethereum, TxKind::TokenTransfer),
    ];

    let totals = metrics::totals_by_side(&txs, &me);
    assert_eq!(totals.received_wei, units(1));
    assert_eq!(totals.sent_wei, U256::zero());

    let counts = metrics::token_transfer_counts(&txs);
    assert_eq!(counts["USDC"], 1);
    assert_eq!(counts[metrics::UNKNOWN_TOKEN], 1);
}

#[test]
fn test_gas_average_ignores_missing_prices() {
    let txs = vec![
        transfer("0x1", 2, 1, units(1), 1).with_gas_price(U256::from(30_000_000_000u64)),
        transfer("0x2", 2, 1, units(1), 2).with_gas_price(U256::from(10_000_000_000u64)),
        transfer("0x3", 2, 1, units(1), 3),
    ];
    assert_eq!(metrics::average_gas_price(&txs), U256::from(20_000_000_000u64));
}

#[test]
fn test_fifo_lot_matching() {
    let mut ledger = FifoLedger::new();
    ledger.buy(units(2), 100.0);
    ledger.buy(units(3), 200.0);
    let matches = ledger.sell(units(4), 250.0);

    let consumed: Vec<(U256, f64)> = matches.iter().map(|m| (m.amount_wei, m.purchase_price)).collect();
    assert_eq!(consumed, vec![(units(2), 100.0), (units(2), 200.0)]);

    let open: Vec<_> = ledger.open_lots().collect();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].amount_wei, units(1));
    assert_eq!(open[0].price, 200.0);
    assert!(close(ledger.realized_gain(), 2.0 * 150.0 + 2.0 * 50.0));
}

#[test]
fn test_capital_gains_follow_time_order() {
    let me = addr(1);
    // Listed out of order; timestamps decide the replay
    let txs = vec![
        transfer("0xsell", 1, 9, units(4), 30),
        transfer("0xbuy2", 8, 1, units(3), 20),
        transfer("0xbuy1", 7, 1, units(2), 10),
    ];

    let cfg = ScoringConfig::default();
    let estimate = metrics::estimate_capital_gains(&txs, &me, &cfg);

    let expected_gain = 4.0 * (cfg.assumed_sale_price - cfg.assumed_purchase_price);
    assert!(close(estimate.realized_gain, expected_gain));
    assert!(close(estimate.estimated_tax, expected_gain * cfg.tax_rate));
    assert_eq!(estimate.open_lots.len(), 1);
    assert_eq!(estimate.open_lots[0].amount_wei, units(1));
    assert_eq!(estimate.unmatched_sale_wei, U256::zero());
}

#[tokio::test]
async fn test_engine_metrics_from_fetched_history() {
    let txs = vec![
        transfer("0x1", 2, 1, units(1), 1),
        transfer("0x2", 1, 3, units(2), 2),
    ];
    let engine = engine(SnapshotSource::from_transactions(txs), Dataset::empty());
    let me = addr(1).to_string();

    let fetch = engine.fetch_history(&me, Some("ethereum")).await.unwrap();
    assert!(fetch.is_complete());
    assert_eq!(fetch.transactions.len(), 2);

    let bundle = engine.compute_metrics(&me, &fetch.transactions).unwrap();
    assert_eq!(bundle.eth_sent_wei, units(2));
    assert_eq!(bundle.eth_received_wei, units(1));
    assert!(engine.compute_metrics("garbage", &[]).is_err());
}

#[tokio::test]
async fn test_full_report_for_dusted_address() {
    let flagged = 0xa;
    let record = RelationshipRecord::new(addr(flagged)).with_parent(addr(0xb));
    let dataset = Dataset::new(vec![record], Vec::new());

    let txs = vec![
        transfer("0xd1", flagged, 1, units_to_wei(0.00001), 1),
        transfer("0xd2", flagged, 1, units_to_wei(0.00002), 2),
        transfer("0x03", 1, 5, units(1), 3),
    ];
    let engine = engine(SnapshotSource::from_transactions(txs), dataset);

    let report = engine.analyze_address(&addr(1).to_string(), Some("ethereum")).await.unwrap();

    assert_eq!(report.status(), RiskStatus::Pass);
    assert!(report.risk_score > 0);
    assert_eq!(report.summary.fraud_risk_summary.flagged, 1);
    assert!(report.findings.iter().any(|f| f.severity == Severity::Critical));
    assert!(report
        .findings
        .windows(2)
        .all(|pair| pair[0].severity >= pair[1].severity));
    assert!(!report.recommendations.is_empty());
    assert!(report.analyzer_results.contains_key("dusting"));

    let rendered = report.to_string();
    assert!(rendered.contains("WALLET FORENSICS REPORT"));
    assert!(rendered.contains(&addr(1).to_string()));
}

#[tokio::test]
async fn test_report_for_warning_address_recommends_monitoring() {
    let record = RelationshipRecord::new(addr(0xa)).with_parent(addr(0xb));
    let dataset = Dataset::new(vec![record], Vec::new());
    let txs = vec![transfer("0x1", 0xa, 0xb, units(1), 1)];
    let engine = engine(SnapshotSource::from_transactions(txs), dataset);

    let report = engine.analyze_address(&addr(0xb).to_string(), Some("ethereum")).await.unwrap();
    assert_eq!(report.status(), RiskStatus::Warning);
    assert!(report.recommendations[0].starts_with("Monitor"));
    assert_eq!(report.classification.evidence.len(), 1);
}
