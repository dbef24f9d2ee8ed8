//! Strategy seam: how a combo picks, tracks, orders and values its legs.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ComboAlgo, ComboCore, ComboError, OrderSide};
use crate::domain::shared::ComboOrderId;

/// Expiry horizons for the front and back legs, in calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadSpecs {
    /// Minimum days to the front expiry.
    pub days_front: i64,
    /// Minimum days to the back expiry.
    pub days_back: i64,
}

impl SpreadSpecs {
    /// Horizons.
    #[must_use]
    pub const fn new(days_front: i64, days_back: i64) -> Self {
        Self {
            days_front,
            days_back,
        }
    }
}

impl Default for SpreadSpecs {
    fn default() -> Self {
        Self::new(7, 30)
    }
}

/// A combo strategy.
///
/// `init` opens (or adopts restored) legs for each role and installs their
/// trackers. `place_order` and `net` have defaults covering most strategies.
pub trait ComboStrategy: Send {
    /// Tag written into leg notes.
    fn algo(&self) -> ComboAlgo;

    /// Choose contracts from the chain snapshot and set up every role.
    ///
    /// # Errors
    ///
    /// Returns a chain lookup or leg construction error.
    fn init(
        &mut self,
        core: &mut ComboCore,
        date: NaiveDate,
        price: Decimal,
        specs: &SpreadSpecs,
    ) -> Result<(), ComboError>;

    /// Submit the opening order.
    ///
    /// # Errors
    ///
    /// As `ComboCore::place_order`.
    fn place_order(
        &mut self,
        core: &mut ComboCore,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<ComboOrderId, ComboError> {
        core.place_order(side, quantity)
    }

    /// Net P/L of the combo at underlying `price`.
    fn net(&self, core: &ComboCore, price: Decimal) -> Decimal {
        core.mark_to_market(price)
    }
}
