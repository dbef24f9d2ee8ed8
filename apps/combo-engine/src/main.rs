//! Combo Engine Binary
//!
//! Aggregates a chain snapshot and optionally previews the opening order of
//! the configured combo.
//!
//! # Usage
//!
//! ```bash
//! CHAIN_SNAPSHOT=chains.json cargo run --bin combo-engine
//! ```
//!
//! # Environment Variables
//!
//! - `COMBO_CONFIG`: YAML config path (default: config.yaml)
//! - `CHAIN_SNAPSHOT`: JSON contract list (default: chains.json)
//! - `UNDERLYING_PRICE`: when set, prepare the configured combo at this price
//! - `AS_OF`: session date, YYYY-MM-DD (default: today, UTC)
//! - `RUST_LOG`: overrides the configured log level

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::info;

use combo_engine::chain::{ChainAggregator, JsonFileDiscovery};
use combo_engine::combo::{Collaborators, Combo, ComboOrder, OrderSide};
use combo_engine::config::{Config, load_config};
use combo_engine::domain::option_position::Portfolio;
use combo_engine::domain::shared::{PortfolioId, Symbol};
use combo_engine::{strategies, telemetry};

const DEFAULT_SNAPSHOT: &str = "chains.json";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var("COMBO_CONFIG").ok();
    let config = load_config(config_path.as_deref()).context("loading configuration")?;
    telemetry::init_tracing(&config.observability.logging)?;

    info!(underlying = %config.chains.underlying, "Starting combo engine");

    let snapshot = std::env::var("CHAIN_SNAPSHOT").unwrap_or_else(|_| DEFAULT_SNAPSHOT.to_string());
    let discovery = JsonFileDiscovery::new(&snapshot);

    let mut aggregator = ChainAggregator::new(config.chains.underlying.as_str())
        .with_min_strikes(config.chains.min_strikes_per_chain);
    let stats = aggregator
        .load_chains(&discovery)
        .await
        .with_context(|| format!("loading chains from {snapshot}"))?;
    let summary = aggregator.filter_chains().context("filtering chains")?;

    info!(
        delivered = stats.delivered,
        kept = summary.kept.len(),
        dropped = summary.dropped.len(),
        average_strikes = %summary.average_strikes,
        "Chains ready"
    );
    aggregator.walk_chains(|expiry, chain| {
        info!(%expiry, strikes = chain.len(), "Expiry");
    });

    if let Ok(price) = std::env::var("UNDERLYING_PRICE") {
        let price: Decimal = price.parse().context("parsing UNDERLYING_PRICE")?;
        let date = match std::env::var("AS_OF") {
            Ok(date) => date.parse::<NaiveDate>().context("parsing AS_OF")?,
            Err(_) => Utc::now().date_naive(),
        };
        preview(&config, aggregator, date, price)?;
    }

    info!("Combo engine finished");
    Ok(())
}

/// Prepare the configured combo and log its opening order.
fn preview(
    config: &Config,
    aggregator: ChainAggregator,
    date: NaiveDate,
    price: Decimal,
) -> Result<()> {
    let underlying = Symbol::new(config.chains.underlying.as_str());
    let portfolio = Arc::new(Portfolio::new(
        PortfolioId::generate(),
        underlying,
        format!("{} preview", config.combo.strategy),
    ));

    let collaborators = Collaborators::default().with_submit_order(|order: &ComboOrder| {
        for leg in order.legs() {
            info!(
                order_id = %order.id(),
                purpose = %order.purpose(),
                symbol = %leg.symbol,
                side = %leg.side,
                quantity = %leg.quantity,
                price = %leg.price,
                "Order leg"
            );
        }
    });

    let mut combo = Combo::new(strategies::for_algo(config.combo.strategy), config.combo.clone());
    combo.set_portfolio(portfolio);
    combo
        .prepare(
            date,
            price,
            Arc::new(aggregator.into_chains()),
            &config.combo.spread,
            collaborators,
        )
        .context("preparing combo")?;
    let order = combo
        .place_order(OrderSide::Buy, Decimal::ONE)
        .context("placing opening order")?;

    info!(%order, net = %combo.net(price), "Combo previewed");
    Ok(())
}
