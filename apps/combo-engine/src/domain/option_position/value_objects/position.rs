//! Position Value Object
//!
//! The filled side of a leg. Positions are built by the external position
//! collaborator and owned by the combo leg they belong to; the free-text
//! `note` carries the encoded leg role and lifecycle state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::OptionContract;
use crate::domain::option_position::OptionPositionError;
use crate::domain::shared::{PortfolioId, PositionId, Symbol};

/// A trading position on one option contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    id: PositionId,
    portfolio_id: PortfolioId,
    contract: OptionContract,
    /// Signed filled quantity (negative when short).
    quantity: Decimal,
    /// Average fill price per share of the open quantity.
    average_price: Decimal,
    /// Realized profit/loss from reducing fills.
    realized_pnl: Decimal,
    /// Free-text annotation (encoded leg note).
    note: String,
}

impl Position {
    /// Create a flat position.
    #[must_use]
    pub fn new(id: PositionId, portfolio_id: PortfolioId, contract: OptionContract) -> Self {
        Self {
            id,
            portfolio_id,
            contract,
            quantity: Decimal::ZERO,
            average_price: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            note: String::new(),
        }
    }

    /// Create a position that already holds quantity (e.g., from a broker restore).
    #[must_use]
    pub fn with_holding(mut self, quantity: Decimal, average_price: Decimal) -> Self {
        self.quantity = quantity;
        self.average_price = average_price;
        self
    }

    /// Attach a note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Position identifier.
    #[must_use]
    pub const fn id(&self) -> &PositionId {
        &self.id
    }

    /// Portfolio the position rolls up to.
    #[must_use]
    pub const fn portfolio_id(&self) -> &PortfolioId {
        &self.portfolio_id
    }

    /// Contract held.
    #[must_use]
    pub const fn contract(&self) -> &OptionContract {
        &self.contract
    }

    /// Provider symbol of the contract held.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        self.contract.symbol()
    }

    /// Signed filled quantity.
    #[must_use]
    pub const fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Average fill price per share.
    #[must_use]
    pub const fn average_price(&self) -> Decimal {
        self.average_price
    }

    /// Realized profit/loss.
    #[must_use]
    pub const fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    /// Whether any quantity is held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !self.quantity.is_zero()
    }

    /// Free-text note.
    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }

    /// Replace the note.
    pub fn set_note(&mut self, note: impl Into<String>) {
        self.note = note.into();
    }

    /// Apply a fill of `signed_quantity` contracts at `price` per share.
    ///
    /// Increasing fills move the average price; reducing fills realize
    /// profit/loss against it.
    pub fn apply_fill(&mut self, signed_quantity: Decimal, price: Decimal) {
        let held = self.quantity;
        let after = held + signed_quantity;
        let multiplier = Decimal::from(self.contract.multiplier());

        if held.is_zero() || held.is_sign_positive() == signed_quantity.is_sign_positive() {
            if !after.is_zero() {
                self.average_price = (self.average_price * held.abs()
                    + price * signed_quantity.abs())
                    / after.abs();
            }
        } else {
            let closed = signed_quantity.abs().min(held.abs());
            let direction = if held.is_sign_positive() {
                Decimal::ONE
            } else {
                Decimal::NEGATIVE_ONE
            };
            self.realized_pnl += (price - self.average_price) * closed * direction * multiplier;

            if after.is_zero() {
                self.average_price = Decimal::ZERO;
            } else if after.is_sign_positive() != held.is_sign_positive() {
                self.average_price = price;
            }
        }

        self.quantity = after;
    }

    /// Apply a fill after checking it is for this position's contract.
    ///
    /// # Errors
    ///
    /// Returns `ContractMismatch` when the fill is for another symbol.
    pub fn apply_fill_for(
        &mut self,
        symbol: &Symbol,
        signed_quantity: Decimal,
        price: Decimal,
    ) -> Result<(), OptionPositionError> {
        if symbol != self.symbol() {
            return Err(OptionPositionError::ContractMismatch {
                symbol: symbol.to_string(),
                position_symbol: self.symbol().to_string(),
            });
        }
        self.apply_fill(signed_quantity, price);
        Ok(())
    }

    /// Unrealized profit/loss at a mark price per share.
    #[must_use]
    pub fn unrealized_pnl(&self, mark: Decimal) -> Decimal {
        (mark - self.average_price) * self.quantity * Decimal::from(self.contract.multiplier())
    }

    /// Absolute premium paid or received for the open quantity.
    #[must_use]
    pub fn cost_basis(&self) -> Decimal {
        self.average_price * self.quantity.abs() * Decimal::from(self.contract.multiplier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::option_position::OptionRight;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn position() -> Position {
        let contract = OptionContract::occ(
            "SPY",
            dec!(450),
            NaiveDate::from_ymd_opt(2025, 1, 17).unwrap(),
            OptionRight::Put,
        );
        Position::new(PositionId::new("p-1"), PortfolioId::new("pf"), contract)
    }

    #[test]
    fn long_fills_average_and_realize() {
        let mut p = position();
        p.apply_fill(dec!(2), dec!(1.00));
        p.apply_fill(dec!(2), dec!(2.00));
        assert_eq!(p.quantity(), dec!(4));
        assert_eq!(p.average_price(), dec!(1.50));

        p.apply_fill(dec!(-4), dec!(2.50));
        assert!(!p.is_open());
        assert_eq!(p.realized_pnl(), dec!(400));
        assert_eq!(p.average_price(), Decimal::ZERO);
    }

    #[test]
    fn short_position_profits_when_mark_falls() {
        let mut p = position();
        p.apply_fill(dec!(-1), dec!(3.00));
        assert_eq!(p.unrealized_pnl(dec!(1.00)), dec!(200));
        assert_eq!(p.cost_basis(), dec!(300));

        p.apply_fill(dec!(1), dec!(1.00));
        assert_eq!(p.realized_pnl(), dec!(200));
    }

    #[test]
    fn fill_for_other_symbol_is_rejected() {
        let mut p = position();
        let err = p
            .apply_fill_for(&Symbol::new("SPY250117C00450000"), dec!(1), dec!(1))
            .unwrap_err();
        assert!(matches!(err, OptionPositionError::ContractMismatch { .. }));
        assert!(!p.is_open());
    }
}
