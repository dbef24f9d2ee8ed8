//! Live evaluation state for one leg's contract.
//!
//! The tracker is fed quote and greek updates for its contract (routed
//! through the owning combo) and exposes the latest mark and sensitivities
//! to the leg's tests and to chart output.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::option_position::{Greeks, OptionContract, PositionSide};
use crate::domain::shared::Symbol;

/// How a leg is managed once tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackProfile {
    /// Long legs roll on decay, short legs close, lock or roll on threat.
    pub side: PositionSide,
    /// Minimum days to expiry when selecting a roll target.
    pub days_to_expiry: i64,
    /// Absolute delta limit for delta-triggered rolls.
    pub max_delta: Decimal,
}

impl TrackProfile {
    /// Profile for a long option.
    #[must_use]
    pub const fn long(days_to_expiry: i64, max_delta: Decimal) -> Self {
        Self {
            side: PositionSide::Long,
            days_to_expiry,
            max_delta,
        }
    }

    /// Profile for a short option.
    #[must_use]
    pub const fn short(days_to_expiry: i64, max_delta: Decimal) -> Self {
        Self {
            side: PositionSide::Short,
            days_to_expiry,
            max_delta,
        }
    }
}

/// Latest top of book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Bid price.
    pub bid: Decimal,
    /// Ask price.
    pub ask: Decimal,
}

impl Quote {
    /// Mid price.
    #[must_use]
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }
}

/// Subscription state for one leg.
#[derive(Debug, Clone)]
pub struct Tracker {
    symbol: Symbol,
    profile: Option<TrackProfile>,
    quote: Option<Quote>,
    greeks: Option<Greeks>,
    implied_volatility: Option<Decimal>,
    updated_at: Option<DateTime<Utc>>,
}

impl Tracker {
    /// Unbound tracker for a contract.
    #[must_use]
    pub fn new(contract: &OptionContract) -> Self {
        Self {
            symbol: contract.symbol().clone(),
            profile: None,
            quote: None,
            greeks: None,
            implied_volatility: None,
            updated_at: None,
        }
    }

    /// Tracked symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Bind to a management profile.
    pub const fn bind(&mut self, profile: TrackProfile) {
        self.profile = Some(profile);
    }

    /// Drop the binding and any cached market data.
    pub fn unbind(&mut self) {
        self.profile = None;
        self.quote = None;
        self.greeks = None;
        self.implied_volatility = None;
        self.updated_at = None;
    }

    /// Bound profile.
    #[must_use]
    pub const fn profile(&self) -> Option<&TrackProfile> {
        self.profile.as_ref()
    }

    /// Whether a profile is bound.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.profile.is_some()
    }

    /// Record a quote.
    pub const fn on_quote(&mut self, quote: Quote, time: DateTime<Utc>) {
        self.quote = Some(quote);
        self.updated_at = Some(time);
    }

    /// Record greeks and implied volatility.
    pub const fn on_greeks(
        &mut self,
        greeks: Greeks,
        implied_volatility: Decimal,
        time: DateTime<Utc>,
    ) {
        self.greeks = Some(greeks);
        self.implied_volatility = Some(implied_volatility);
        self.updated_at = Some(time);
    }

    /// Latest quote.
    #[must_use]
    pub const fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    /// Mid of the latest quote.
    #[must_use]
    pub fn mark(&self) -> Option<Decimal> {
        self.quote.as_ref().map(Quote::mid)
    }

    /// Latest per-share greeks.
    #[must_use]
    pub const fn greeks(&self) -> Option<&Greeks> {
        self.greeks.as_ref()
    }

    /// Latest absolute delta.
    #[must_use]
    pub fn abs_delta(&self) -> Option<Decimal> {
        self.greeks.map(|g| g.delta.abs())
    }

    /// Latest implied volatility.
    #[must_use]
    pub const fn implied_volatility(&self) -> Option<Decimal> {
        self.implied_volatility
    }

    /// Time of the latest update.
    #[must_use]
    pub const fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}
