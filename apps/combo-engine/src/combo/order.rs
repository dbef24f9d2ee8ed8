//! Combo order book entries.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::LegId;
use crate::domain::option_position::PositionSide;
use crate::domain::shared::{ComboOrderId, Symbol};

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    /// Buy.
    Buy,
    /// Sell.
    Sell,
}

impl OrderSide {
    /// Side that opens `side`.
    #[must_use]
    pub const fn opening(side: PositionSide) -> Self {
        match side {
            PositionSide::Long => Self::Buy,
            PositionSide::Short => Self::Sell,
        }
    }

    /// Side that closes `side`.
    #[must_use]
    pub const fn closing(side: PositionSide) -> Self {
        match side {
            PositionSide::Long => Self::Sell,
            PositionSide::Short => Self::Buy,
        }
    }

    /// Sign applied to quantities.
    #[must_use]
    pub const fn sign(&self) -> Decimal {
        match self {
            Self::Buy => Decimal::ONE,
            Self::Sell => Decimal::NEGATIVE_ONE,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Why an order was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderPurpose {
    /// Open a combo's legs.
    Open,
    /// Close legs.
    Close,
    /// Open the new half of a roll.
    RollOpen,
    /// Close the old half of a roll.
    RollClose,
}

impl OrderPurpose {
    /// Snake-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::RollOpen => "roll_open",
            Self::RollClose => "roll_close",
        }
    }
}

impl fmt::Display for OrderPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One leg of a combo order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLeg {
    /// Leg the fill applies to.
    pub leg_id: LegId,
    /// Contract symbol.
    pub symbol: Symbol,
    /// Direction.
    pub side: OrderSide,
    /// Unsigned contract count.
    pub quantity: Decimal,
    /// Limit price per share.
    pub price: Decimal,
}

impl OrderLeg {
    /// Quantity signed by side.
    #[must_use]
    pub fn signed_quantity(&self) -> Decimal {
        self.quantity * self.side.sign()
    }
}

/// Outstanding multi-leg order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboOrder {
    id: ComboOrderId,
    purpose: OrderPurpose,
    legs: Vec<OrderLeg>,
}

impl ComboOrder {
    /// New order with a generated id.
    #[must_use]
    pub fn new(purpose: OrderPurpose, legs: Vec<OrderLeg>) -> Self {
        Self {
            id: ComboOrderId::generate(),
            purpose,
            legs,
        }
    }

    /// Order id.
    #[must_use]
    pub const fn id(&self) -> &ComboOrderId {
        &self.id
    }

    /// Purpose.
    #[must_use]
    pub const fn purpose(&self) -> OrderPurpose {
        self.purpose
    }

    /// Legs.
    #[must_use]
    pub fn legs(&self) -> &[OrderLeg] {
        &self.legs
    }

    /// Whether the order touches `leg_id`.
    #[must_use]
    pub fn involves(&self, leg_id: LegId) -> bool {
        self.legs.iter().any(|l| l.leg_id == leg_id)
    }

    /// Net premium per share; positive is a debit.
    #[must_use]
    pub fn net_premium(&self) -> Decimal {
        self.legs
            .iter()
            .map(|l| l.price * l.signed_quantity())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order_leg(id: u64, side: OrderSide, price: Decimal) -> OrderLeg {
        OrderLeg {
            leg_id: LegId(id),
            symbol: Symbol::new("SPY250117C00450000"),
            side,
            quantity: dec!(2),
            price,
        }
    }

    #[test]
    fn opening_and_closing_sides() {
        assert_eq!(OrderSide::opening(PositionSide::Short), OrderSide::Sell);
        assert_eq!(OrderSide::closing(PositionSide::Short), OrderSide::Buy);
    }

    #[test]
    fn net_premium_is_signed() {
        let order = ComboOrder::new(
            OrderPurpose::Open,
            vec![
                order_leg(1, OrderSide::Buy, dec!(3)),
                order_leg(2, OrderSide::Sell, dec!(1.25)),
            ],
        );
        assert_eq!(order.net_premium(), dec!(3.5));
        assert!(order.involves(LegId(2)));
        assert!(!order.involves(LegId(3)));
    }
}
