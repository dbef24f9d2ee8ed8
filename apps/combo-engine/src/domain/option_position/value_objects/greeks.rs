//! Options Greeks value object.
//!
//! Greeks are computed by the external pricing collaborator; the combo only
//! aggregates them for chart series and delta-based roll tests.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Options Greeks for one contract (per share, unsigned by position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta - directional exposure.
    pub delta: Decimal,
    /// Gamma - rate of change of delta.
    pub gamma: Decimal,
    /// Vega - sensitivity to volatility.
    pub vega: Decimal,
    /// Theta - time decay per day.
    pub theta: Decimal,
}

impl Greeks {
    /// Zero Greeks.
    pub const ZERO: Self = Self {
        delta: Decimal::ZERO,
        gamma: Decimal::ZERO,
        vega: Decimal::ZERO,
        theta: Decimal::ZERO,
    };

    /// Create new Greeks.
    #[must_use]
    pub const fn new(delta: Decimal, gamma: Decimal, vega: Decimal, theta: Decimal) -> Self {
        Self {
            delta,
            gamma,
            vega,
            theta,
        }
    }

    /// Create Greeks with just delta.
    #[must_use]
    pub fn with_delta(delta: Decimal) -> Self {
        Self {
            delta,
            ..Self::ZERO
        }
    }

    /// Scale Greeks by a factor (signed quantity × multiplier).
    #[must_use]
    pub fn scale(&self, factor: Decimal) -> Self {
        Self {
            delta: self.delta * factor,
            gamma: self.gamma * factor,
            vega: self.vega * factor,
            theta: self.theta * factor,
        }
    }
}

impl Add for Greeks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            delta: self.delta + rhs.delta,
            gamma: self.gamma + rhs.gamma,
            vega: self.vega + rhs.vega,
            theta: self.theta + rhs.theta,
        }
    }
}

impl AddAssign for Greeks {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn greeks_scale_and_add() {
        let g = Greeks::new(dec!(0.50), dec!(0.05), dec!(0.20), dec!(-0.03));
        let short = g.scale(dec!(-2));
        assert_eq!(short.delta, dec!(-1.00));
        assert_eq!(short.theta, dec!(0.06));

        let mut total = Greeks::ZERO;
        total += g;
        total += Greeks::with_delta(dec!(-0.25));
        assert_eq!(total.delta, dec!(0.25));
        assert_eq!(total.gamma, dec!(0.05));
    }
}
