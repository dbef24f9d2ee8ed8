//! Short strangle at the front expiry.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::chain::select_expiry;
use crate::combo::{
    ComboAlgo, ComboCore, ComboError, ComboStrategy, LegRole, SpreadSpecs, TrackProfile,
};
use crate::domain::option_position::{OptionRight, PositionSide};

/// Strangle strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct Strangle;

impl Strangle {
    /// New strangle.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ComboStrategy for Strangle {
    fn algo(&self) -> ComboAlgo {
        ComboAlgo::Strangle
    }

    fn init(
        &mut self,
        core: &mut ComboCore,
        date: NaiveDate,
        price: Decimal,
        specs: &SpreadSpecs,
    ) -> Result<(), ComboError> {
        let chains = core.shared_chains();
        let (expiry, chain) = select_expiry(&chains, date, specs.days_front)?;
        let call = chain.otm(OptionRight::Call, price)?;
        let put = chain.otm(OptionRight::Put, price)?;

        let call_id = core.ensure_leg(
            LegRole::ShortCall,
            expiry,
            call,
            OptionRight::Call,
            PositionSide::Short,
        )?;
        let put_id = core.ensure_leg(
            LegRole::ShortPut,
            expiry,
            put,
            OptionRight::Put,
            PositionSide::Short,
        )?;

        let profile = TrackProfile::short(specs.days_front, core.config().max_strangle_delta);
        core.init_tracker(call_id, profile)?;
        core.init_tracker(put_id, profile)?;

        info!(%expiry, %call, %put, "Strangle initialised");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combo::OrderSide;
    use crate::strategies::fixtures::prepared;
    use rust_decimal_macros::dec;

    #[test]
    fn straddles_the_price_with_short_wings() {
        let combo = prepared(Box::new(Strangle::new()));
        let core = combo.core();

        let call = core.live_leg(LegRole::ShortCall).unwrap();
        let put = core.live_leg(LegRole::ShortPut).unwrap();
        assert_eq!(call.contract().strike(), dec!(101));
        assert_eq!(put.contract().strike(), dec!(100));
        assert_eq!(call.leg().side(), PositionSide::Short);
        assert_eq!(
            call.tracker().profile().unwrap().max_delta,
            core.config().max_strangle_delta
        );
    }

    #[test]
    fn sell_side_inverts_every_leg() {
        let mut combo = prepared(Box::new(Strangle::new()));
        let id = combo.place_order(OrderSide::Sell, dec!(1)).unwrap();
        let order = combo.core().order(&id).unwrap();
        assert!(order.legs().iter().all(|l| l.side == OrderSide::Buy));
    }
}
