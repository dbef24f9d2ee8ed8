//! Call diagonal: short OTM front, long ITM back.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use super::front_and_back;
use crate::combo::{ComboAlgo, ComboCore, ComboError, ComboStrategy, LegRole, SpreadSpecs};
use crate::domain::option_position::{OptionRight, PositionSide};

/// Diagonal strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct Diagonal;

impl Diagonal {
    /// New diagonal.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ComboStrategy for Diagonal {
    fn algo(&self) -> ComboAlgo {
        ComboAlgo::Diagonal
    }

    fn init(
        &mut self,
        core: &mut ComboCore,
        date: NaiveDate,
        price: Decimal,
        specs: &SpreadSpecs,
    ) -> Result<(), ComboError> {
        let chains = core.shared_chains();
        let ((front, front_chain), (back, back_chain)) =
            front_and_back(&chains, date, specs.days_front, specs.days_back)?;
        let short_strike = front_chain.otm(OptionRight::Call, price)?;
        let long_strike = back_chain.itm(OptionRight::Call, price)?;

        let front_id = core.ensure_leg(
            LegRole::Front,
            front,
            short_strike,
            OptionRight::Call,
            PositionSide::Short,
        )?;
        let back_id = core.ensure_leg(
            LegRole::Back,
            back,
            long_strike,
            OptionRight::Call,
            PositionSide::Long,
        )?;
        core.init_track_short_option(front_id, specs.days_front)?;
        core.init_track_long_option(back_id, specs.days_back)?;

        info!(%front, %back, %short_strike, %long_strike, "Diagonal initialised");
        Ok(())
    }
}
