// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_collect,
        clippy::items_after_statements
    )
)]

//! Combo Engine - option chain aggregation and multi-leg combo core.
//!
//! # Layout
//!
//! - `domain`: option contracts, legs, positions, portfolios and symbols
//! - `chain`: chain aggregation from a contract discovery feed, filtering to
//!   complete strike sets, and ordered walks
//! - `combo`: the per-leg state machine, tracker tests, rolls, order book
//!   and chart output
//! - `strategies`: collar, strangle, calendar and diagonal combos
//! - `config`, `telemetry`, `metrics`: ambient plumbing
//!
//! The library performs no network I/O. Market data, broker orders and
//! presentation are reached through the collaborator closures in
//! [`combo::Collaborators`] and the [`chain::ContractDiscovery`] trait.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Instruments, positions and identifiers.
pub mod domain;

/// Option chain aggregation.
pub mod chain;

/// Multi-leg combo orchestration.
pub mod combo;

/// Concrete strategies.
pub mod strategies;

/// YAML configuration.
pub mod config;

/// Metric recording helpers.
pub mod metrics;

/// Tracing subscriber setup.
pub mod telemetry;

pub use chain::{ChainAggregator, ChainError, ChainMap, FilterSummary, LoadStats};
pub use combo::{Combo, ComboError, ComboStrategy, LegState, SpreadSpecs};
pub use config::{Config, ConfigError, load_config};
