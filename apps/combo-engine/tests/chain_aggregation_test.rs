//! Integration tests for chain loading, filtering and walking.

use chrono::NaiveDate;
use combo_engine::chain::{ChainAggregator, ChainError, JsonFileDiscovery, StaticDiscovery};
use combo_engine::domain::option_position::{OptionContract, OptionRight};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::io::Write;

fn expiry(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
}

fn contract(day: u32, strike: i64, right: OptionRight) -> OptionContract {
    OptionContract::occ("SPY", Decimal::from(strike), expiry(day), right)
}

/// Ten call strikes, puts on only three of them.
fn partially_matched() -> Vec<OptionContract> {
    let mut contracts: Vec<_> = (95..105).map(|k| contract(17, k, OptionRight::Call)).collect();
    contracts.extend([96, 100, 103].map(|k| contract(17, k, OptionRight::Put)));
    contracts
}

#[tokio::test]
async fn test_three_matched_strikes_of_ten_survive() {
    let mut aggregator = ChainAggregator::new("SPY");
    let stats = aggregator
        .load_chains(&StaticDiscovery::new(partially_matched()))
        .await
        .unwrap();
    assert_eq!(stats.delivered, 13);
    assert_eq!(stats.expiries, 1);

    let summary = aggregator.filter_chains().unwrap();
    assert_eq!(summary.kept.len(), 1);
    assert_eq!(summary.kept[0].strikes, 3);
    assert_eq!(summary.kept[0].pruned, 7);
    assert_eq!(summary.average_strikes, dec!(3));

    let chain = aggregator.chain(expiry(17)).unwrap();
    let strikes: Vec<Decimal> = chain.strikes().map(|(k, _)| k).collect();
    assert_eq!(strikes, vec![dec!(96), dec!(100), dec!(103)]);
    assert!(chain.strikes().all(|(_, entry)| entry.is_complete()));
}

#[tokio::test]
async fn test_lone_incomplete_expiry_fails_without_mutation() {
    let calls: Vec<_> = (95..100).map(|k| contract(17, k, OptionRight::Call)).collect();
    let mut aggregator = ChainAggregator::new("SPY");
    aggregator.load_chains(&StaticDiscovery::new(calls)).await.unwrap();

    let err = aggregator.filter_chains().unwrap_err();
    assert!(matches!(err, ChainError::AllChainsIncomplete { .. }));
    assert!(!aggregator.is_filtered());
    assert_eq!(aggregator.chain(expiry(17)).unwrap().len(), 5);
}

#[tokio::test]
async fn test_resent_contracts_are_idempotent() {
    let discovery = StaticDiscovery::new(partially_matched());
    let mut once = ChainAggregator::new("SPY");
    once.load_chains(&discovery).await.unwrap();

    let mut twice = ChainAggregator::new("SPY");
    twice.load_chains(&discovery).await.unwrap();
    let second = twice.load_chains(&discovery).await.unwrap();
    assert_eq!(second.recorded, 0);
    assert_eq!(second.duplicates, 13);
    assert_eq!(second.expiries, 0);

    assert_eq!(once.filter_chains().unwrap(), twice.filter_chains().unwrap());
    assert_eq!(once.chains(), twice.chains());
}

#[tokio::test]
async fn test_other_underlyings_are_not_recorded() {
    let mut contracts = partially_matched();
    contracts.push(OptionContract::occ("QQQ", dec!(400), expiry(17), OptionRight::Call));

    let mut aggregator = ChainAggregator::new("SPY");
    let stats = aggregator.load_chains(&StaticDiscovery::new(contracts)).await.unwrap();
    assert_eq!(stats.delivered, 13);
}

#[tokio::test]
async fn test_walks_follow_expiry_then_strike_order() {
    let mut contracts = Vec::new();
    for day in [24, 10, 17] {
        for strike in [101, 99, 100] {
            contracts.push(contract(day, strike, OptionRight::Put));
            contracts.push(contract(day, strike, OptionRight::Call));
        }
    }
    let mut aggregator = ChainAggregator::new("SPY");
    aggregator.load_chains(&StaticDiscovery::new(contracts)).await.unwrap();
    aggregator.filter_chains().unwrap();

    let mut dates = Vec::new();
    aggregator.walk_chains(|date, _| dates.push(date));
    assert_eq!(dates, vec![expiry(10), expiry(17), expiry(24)]);

    let mut seen = Vec::new();
    aggregator
        .walk_chain(expiry(17), |option| seen.push((option.strike(), option.right())))
        .unwrap();
    assert_eq!(
        seen,
        vec![
            (dec!(99), OptionRight::Call),
            (dec!(99), OptionRight::Put),
            (dec!(100), OptionRight::Call),
            (dec!(100), OptionRight::Put),
            (dec!(101), OptionRight::Call),
            (dec!(101), OptionRight::Put),
        ]
    );
}

#[tokio::test]
async fn test_walk_chain_on_missing_date_visits_nothing() {
    let mut aggregator = ChainAggregator::new("SPY");
    aggregator
        .load_chains(&StaticDiscovery::new(partially_matched()))
        .await
        .unwrap();
    aggregator.filter_chains().unwrap();

    let mut visited = 0;
    let err = aggregator.walk_chain(expiry(18), |_| visited += 1).unwrap_err();
    assert!(matches!(err, ChainError::DateNotFound { .. }));
    assert_eq!(visited, 0);
}

#[tokio::test]
async fn test_json_snapshot_loads_full_and_occ_records() {
    let full = serde_json::to_value(contract(17, 100, OptionRight::Call)).unwrap();
    let occ = contract(17, 100, OptionRight::Put).symbol().to_string();
    let snapshot = serde_json::json!([full, { "symbol": occ }]);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{snapshot}").unwrap();

    let mut aggregator = ChainAggregator::new("SPY");
    let stats = aggregator
        .load_chains(&JsonFileDiscovery::new(file.path()))
        .await
        .unwrap();
    assert_eq!(stats.delivered, 2);

    let summary = aggregator.filter_chains().unwrap();
    assert_eq!(summary.kept[0].strikes, 1);
}
