//! Per-expiry option chain.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::ChainError;
use crate::domain::option_position::{OptionContract, OptionRight};
use crate::domain::shared::Symbol;

/// One side (call or put) at a strike.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSlot {
    symbol: Option<Symbol>,
    contract: Option<OptionContract>,
}

impl OptionSlot {
    /// Provider symbol name, if discovered.
    #[must_use]
    pub const fn symbol(&self) -> Option<&Symbol> {
        self.symbol.as_ref()
    }

    /// Contract handle, if discovered.
    #[must_use]
    pub const fn contract(&self) -> Option<&OptionContract> {
        self.contract.as_ref()
    }

    /// Whether a non-empty symbol name is present.
    #[must_use]
    pub fn is_named(&self) -> bool {
        self.symbol.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// Call and put at one strike.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrikeEntry {
    /// Call side.
    pub call: OptionSlot,
    /// Put side.
    pub put: OptionSlot,
}

impl StrikeEntry {
    /// Both call and put symbol names are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.call.is_named() && self.put.is_named()
    }

    /// Slot for a side.
    #[must_use]
    pub const fn slot(&self, right: OptionRight) -> &OptionSlot {
        match right {
            OptionRight::Call => &self.call,
            OptionRight::Put => &self.put,
        }
    }

    const fn slot_mut(&mut self, right: OptionRight) -> &mut OptionSlot {
        match right {
            OptionRight::Call => &mut self.call,
            OptionRight::Put => &mut self.put,
        }
    }
}

/// Option chain for one underlying and one expiry, indexed by strike.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    strikes: BTreeMap<Decimal, StrikeEntry>,
}

impl Chain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the entry for a strike.
    pub fn strike_mut(&mut self, strike: Decimal) -> &mut StrikeEntry {
        self.strikes.entry(strike.normalize()).or_default()
    }

    /// Entry for a strike.
    #[must_use]
    pub fn get(&self, strike: Decimal) -> Option<&StrikeEntry> {
        self.strikes.get(&strike.normalize())
    }

    /// Record the provider name for one side of a strike.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateOption` if the side already has a name; the existing
    /// name is left untouched.
    pub fn set_name(
        &mut self,
        strike: Decimal,
        right: OptionRight,
        symbol: Symbol,
    ) -> Result<(), ChainError> {
        let slot = self.strike_mut(strike).slot_mut(right);
        if slot.symbol.is_some() {
            return Err(ChainError::DuplicateOption { strike, right });
        }
        slot.symbol = Some(symbol);
        Ok(())
    }

    /// Record a discovered contract under its strike and side.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateOption` if the side is already registered.
    pub fn insert(&mut self, contract: OptionContract) -> Result<(), ChainError> {
        let strike = contract.strike();
        let right = contract.right();
        self.set_name(strike, right, contract.symbol().clone())?;
        self.strike_mut(strike).slot_mut(right).contract = Some(contract);
        Ok(())
    }

    /// Remove a strike.
    pub fn erase(&mut self, strike: Decimal) -> Option<StrikeEntry> {
        self.strikes.remove(&strike.normalize())
    }

    /// Number of strikes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strikes.len()
    }

    /// Whether the chain has no strikes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strikes.is_empty()
    }

    /// Strikes in ascending order.
    pub fn strikes(&self) -> impl Iterator<Item = (Decimal, &StrikeEntry)> {
        self.strikes.iter().map(|(strike, entry)| (*strike, entry))
    }

    /// Every discovered contract, call before put at each strike.
    pub fn contracts(&self) -> impl Iterator<Item = &OptionContract> {
        self.strikes
            .values()
            .flat_map(|entry| entry.call.contract().into_iter().chain(entry.put.contract()))
    }

    /// Provider name for a side at a strike.
    ///
    /// # Errors
    ///
    /// Returns `StrikeNotFound` or `MissingOption`.
    pub fn name(&self, strike: Decimal, right: OptionRight) -> Result<&Symbol, ChainError> {
        self.get(strike)
            .ok_or(ChainError::StrikeNotFound { strike })?
            .slot(right)
            .symbol()
            .ok_or(ChainError::MissingOption { strike, right })
    }

    /// Contract for a side at a strike.
    ///
    /// # Errors
    ///
    /// Returns `StrikeNotFound` or `MissingOption`.
    pub fn contract(
        &self,
        strike: Decimal,
        right: OptionRight,
    ) -> Result<&OptionContract, ChainError> {
        self.get(strike)
            .ok_or(ChainError::StrikeNotFound { strike })?
            .slot(right)
            .contract()
            .ok_or(ChainError::MissingOption { strike, right })
    }

    /// Strike nearest to `price`; ties resolve to the lower strike.
    ///
    /// # Errors
    ///
    /// Returns `NoStrikes` on an empty chain.
    pub fn atm(&self, price: Decimal) -> Result<Decimal, ChainError> {
        let below = self.strikes.range(..=price).next_back().map(|(k, _)| *k);
        let above = self.strikes.range(price..).next().map(|(k, _)| *k);
        match (below, above) {
            (Some(lo), Some(hi)) => Ok(if hi - price < price - lo { hi } else { lo }),
            (Some(k), None) | (None, Some(k)) => Ok(k),
            (None, None) => Err(ChainError::NoStrikes),
        }
    }

    /// Highest strike strictly below `price` (ITM call, OTM put).
    ///
    /// # Errors
    ///
    /// Returns `NoStrikes` when nothing is below.
    pub fn strike_below(&self, price: Decimal) -> Result<Decimal, ChainError> {
        self.strikes
            .range(..price)
            .next_back()
            .map(|(k, _)| *k)
            .ok_or(ChainError::NoStrikes)
    }

    /// Lowest strike strictly above `price` (OTM call, ITM put).
    ///
    /// # Errors
    ///
    /// Returns `NoStrikes` when nothing is above.
    pub fn strike_above(&self, price: Decimal) -> Result<Decimal, ChainError> {
        use std::ops::Bound::{Excluded, Unbounded};
        self.strikes
            .range((Excluded(price), Unbounded))
            .next()
            .map(|(k, _)| *k)
            .ok_or(ChainError::NoStrikes)
    }

    /// Nearest out-of-the-money strike for a side.
    ///
    /// # Errors
    ///
    /// Returns `NoStrikes` when the chain has nothing on that side of `price`.
    pub fn otm(&self, right: OptionRight, price: Decimal) -> Result<Decimal, ChainError> {
        match right {
            OptionRight::Call => self.strike_above(price),
            OptionRight::Put => self.strike_below(price),
        }
    }

    /// Nearest in-the-money strike for a side.
    ///
    /// # Errors
    ///
    /// Returns `NoStrikes` when the chain has nothing on that side of `price`.
    pub fn itm(&self, right: OptionRight, price: Decimal) -> Result<Decimal, ChainError> {
        match right {
            OptionRight::Call => self.strike_below(price),
            OptionRight::Put => self.strike_above(price),
        }
    }
}
