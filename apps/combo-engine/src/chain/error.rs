//! Chain errors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use super::DiscoveryError;
use crate::domain::option_position::OptionRight;

/// Errors raised while building, filtering or querying option chains.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Strike already holds a symbol for this side; the first registration wins.
    #[error("Duplicate {right} at strike {strike}")]
    DuplicateOption { strike: Decimal, right: OptionRight },

    /// Strike is not part of the chain.
    #[error("Strike not found: {strike}")]
    StrikeNotFound { strike: Decimal },

    /// Strike exists but the requested side was never discovered.
    #[error("No {right} at strike {strike}")]
    MissingOption { strike: Decimal, right: OptionRight },

    /// Chain has no strikes to select from.
    #[error("Chain has no strikes")]
    NoStrikes,

    /// Requested expiry is absent from the chain map.
    #[error("Date not found: {date}")]
    DateNotFound { date: NaiveDate },

    /// No expiry satisfies the requested distance from a date.
    #[error("No expiry at least {min_days} days after {after}")]
    NoExpiry { after: NaiveDate, min_days: i64 },

    /// Filtering requested with nothing loaded.
    #[error("No chains loaded")]
    NoChains,

    /// Filtering would remove every chain; the discovery feed is broken.
    #[error("All {expiries} chains lack a matched call/put strike")]
    AllChainsIncomplete { expiries: usize },

    /// Chains are read-only once filtered.
    #[error("Chains already filtered")]
    AlreadyFiltered,

    /// Discovery collaborator failed.
    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),
}
