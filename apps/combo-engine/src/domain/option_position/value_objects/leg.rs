//! Combo Leg Value Object
//!
//! A `Leg` is the intent for one constituent of a combo: which contract,
//! which side and how many contracts. The filled quantity lives on the
//! `Position` built for the leg.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::OptionContract;

/// Position side (long or short).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    /// Long position (bought).
    Long,
    /// Short position (sold/written).
    Short,
}

impl PositionSide {
    /// Get the sign multiplier for this side.
    #[must_use]
    pub const fn sign(&self) -> i32 {
        match self {
            Self::Long => 1,
            Self::Short => -1,
        }
    }

    /// The side that flattens a position on this side.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Long => Self::Short,
            Self::Short => Self::Long,
        }
    }

    /// Check if this is a long position.
    #[must_use]
    pub const fn is_long(&self) -> bool {
        matches!(self, Self::Long)
    }
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
        }
    }
}

/// A single leg of a combo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    /// The option contract.
    contract: OptionContract,
    /// Position side.
    side: PositionSide,
    /// Number of contracts intended.
    quantity: Decimal,
}

impl Leg {
    /// Create a new leg.
    #[must_use]
    pub const fn new(contract: OptionContract, side: PositionSide, quantity: Decimal) -> Self {
        Self {
            contract,
            side,
            quantity,
        }
    }

    /// Create a long leg.
    #[must_use]
    pub const fn long(contract: OptionContract, quantity: Decimal) -> Self {
        Self::new(contract, PositionSide::Long, quantity)
    }

    /// Create a short leg.
    #[must_use]
    pub const fn short(contract: OptionContract, quantity: Decimal) -> Self {
        Self::new(contract, PositionSide::Short, quantity)
    }

    /// Get the contract.
    #[must_use]
    pub const fn contract(&self) -> &OptionContract {
        &self.contract
    }

    /// Get the position side.
    #[must_use]
    pub const fn side(&self) -> PositionSide {
        self.side
    }

    /// Get the intended quantity.
    #[must_use]
    pub const fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Get signed quantity (positive for long, negative for short).
    #[must_use]
    pub fn signed_quantity(&self) -> Decimal {
        self.quantity * Decimal::from(self.side.sign())
    }

    /// Same side and quantity on a different contract, used when rolling.
    #[must_use]
    pub fn with_contract(&self, contract: OptionContract) -> Self {
        Self::new(contract, self.side, self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::option_position::OptionRight;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn contract(strike: Decimal) -> OptionContract {
        OptionContract::occ(
            "SPY",
            strike,
            NaiveDate::from_ymd_opt(2025, 1, 17).unwrap(),
            OptionRight::Call,
        )
    }

    #[test]
    fn position_side_sign_and_opposite() {
        assert_eq!(PositionSide::Long.sign(), 1);
        assert_eq!(PositionSide::Short.sign(), -1);
        assert_eq!(PositionSide::Long.opposite(), PositionSide::Short);
    }

    #[test]
    fn leg_signed_quantity() {
        assert_eq!(Leg::long(contract(dec!(450)), dec!(3)).signed_quantity(), dec!(3));
        assert_eq!(Leg::short(contract(dec!(450)), dec!(3)).signed_quantity(), dec!(-3));
    }

    #[test]
    fn leg_with_contract_keeps_intent() {
        let leg = Leg::short(contract(dec!(450)), dec!(2));
        let rolled = leg.with_contract(contract(dec!(455)));
        assert_eq!(rolled.side(), PositionSide::Short);
        assert_eq!(rolled.quantity(), dec!(2));
        assert_eq!(rolled.contract().strike(), dec!(455));
    }
}
