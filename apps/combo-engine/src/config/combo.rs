//! Combo trading thresholds.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::combo::{ComboAlgo, SpreadSpecs};

/// Thresholds used by leg tests and combo-level profit rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboConfig {
    /// Absolute delta above which a leg is rolled to a further strike.
    #[serde(default = "default_max_strike_delta")]
    pub max_strike_delta: Decimal,
    /// Absolute delta above which a strangle side is rolled.
    #[serde(default = "default_max_strangle_delta")]
    pub max_strangle_delta: Decimal,
    /// Days to expiry at or below which a long leg is rolled out.
    #[serde(default = "default_roll_dte")]
    pub roll_dte: i64,
    /// Absolute underlying slope that locks a short leg.
    #[serde(default = "default_lock_slope")]
    pub lock_slope: Decimal,
    /// Fraction of entry credit/debit captured before a leg is closed.
    #[serde(default = "default_take_profit_fraction")]
    pub take_profit_fraction: Decimal,
    /// Net combo P/L at which every leg is closed.
    #[serde(default = "default_combo_profit_target")]
    pub combo_profit_target: Decimal,
    /// ITM depth, as a fraction of the underlying, that counts as far ITM.
    #[serde(default = "default_far_itm_fraction")]
    pub far_itm_fraction: Decimal,
    /// Contracts per leg when a strategy opens a combo.
    #[serde(default = "default_quantity")]
    pub default_quantity: Decimal,
    /// Strategy the binary prepares.
    #[serde(default = "default_strategy")]
    pub strategy: ComboAlgo,
    /// Front and back expiry horizons.
    #[serde(default)]
    pub spread: SpreadSpecs,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            max_strike_delta: default_max_strike_delta(),
            max_strangle_delta: default_max_strangle_delta(),
            roll_dte: default_roll_dte(),
            lock_slope: default_lock_slope(),
            take_profit_fraction: default_take_profit_fraction(),
            combo_profit_target: default_combo_profit_target(),
            far_itm_fraction: default_far_itm_fraction(),
            default_quantity: default_quantity(),
            strategy: default_strategy(),
            spread: SpreadSpecs::default(),
        }
    }
}

const fn default_max_strike_delta() -> Decimal {
    dec!(0.21)
}

const fn default_max_strangle_delta() -> Decimal {
    dec!(0.30)
}

const fn default_roll_dte() -> i64 {
    1
}

const fn default_lock_slope() -> Decimal {
    dec!(0.75)
}

const fn default_take_profit_fraction() -> Decimal {
    dec!(0.50)
}

const fn default_combo_profit_target() -> Decimal {
    dec!(100)
}

const fn default_far_itm_fraction() -> Decimal {
    dec!(0.05)
}

const fn default_quantity() -> Decimal {
    Decimal::ONE
}

const fn default_strategy() -> ComboAlgo {
    ComboAlgo::Collar
}
