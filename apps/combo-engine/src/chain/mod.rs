//! Option chain aggregation.
//!
//! Builds an expiry → strike → {call, put} index from an unordered contract
//! discovery feed, then filters it down to complete chains.
//!
//! ```text
//! ChainAggregator
//!   └── ChainMap (expiry → Chain)
//!         └── Chain (strike → StrikeEntry)
//!               ├── OptionSlot (call)
//!               └── OptionSlot (put)
//! ```
//!
//! The two phases are strict: `load_chains` tolerates duplicate and partial
//! delivery, `filter_chains` runs once afterwards and is the only place
//! completeness is checked.

mod aggregator;
#[allow(clippy::module_inception)]
mod chain;
mod discovery;
mod error;
mod select;

pub use aggregator::{ChainAggregator, ExpirySummary, FilterSummary, LoadStats};
pub use chain::{Chain, OptionSlot, StrikeEntry};
pub use discovery::{
    ContractDiscovery, ContractSink, DiscoveryError, JsonFileDiscovery, StaticDiscovery,
};
pub use error::ChainError;
pub use select::{next_expiry_after, select_expiry};

use std::collections::BTreeMap;

use chrono::NaiveDate;

/// Expiry date → chain, ordered by expiry.
pub type ChainMap = BTreeMap<NaiveDate, Chain>;
