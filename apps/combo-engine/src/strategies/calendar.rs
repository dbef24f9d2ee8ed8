//! Call calendar: short front, long back, one strike.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use super::front_and_back;
use crate::combo::{ComboAlgo, ComboCore, ComboError, ComboStrategy, LegRole, SpreadSpecs};
use crate::domain::option_position::{OptionRight, PositionSide};

/// Calendar strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct Calendar;

impl Calendar {
    /// New calendar.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ComboStrategy for Calendar {
    fn algo(&self) -> ComboAlgo {
        ComboAlgo::Calendar
    }

    fn init(
        &mut self,
        core: &mut ComboCore,
        date: NaiveDate,
        price: Decimal,
        specs: &SpreadSpecs,
    ) -> Result<(), ComboError> {
        let chains = core.shared_chains();
        let ((front, front_chain), (back, _)) =
            front_and_back(&chains, date, specs.days_front, specs.days_back)?;
        let strike = front_chain.atm(price)?;

        let front_id = core.ensure_leg(
            LegRole::Front,
            front,
            strike,
            OptionRight::Call,
            PositionSide::Short,
        )?;
        let back_id = core.ensure_leg(
            LegRole::Back,
            back,
            strike,
            OptionRight::Call,
            PositionSide::Long,
        )?;
        core.init_track_short_option(front_id, specs.days_front)?;
        core.init_track_long_option(back_id, specs.days_back)?;

        info!(%front, %back, %strike, "Calendar initialised");
        Ok(())
    }

    /// The front leg is valued at intrinsic, as it would settle at its
    /// expiry; the back leg keeps its time value at the mark.
    fn net(&self, core: &ComboCore, price: Decimal) -> Decimal {
        core.net_with(|leg| {
            let intrinsic = leg.contract().intrinsic(price);
            if leg.role() == LegRole::Front {
                intrinsic
            } else {
                leg.tracker().mark().unwrap_or(intrinsic)
            }
        })
    }
}
