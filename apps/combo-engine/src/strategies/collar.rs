//! Collar: synthetic long at the back expiry, financed by a front cover
//! call and protected by a back put below the synthetic strike.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use super::front_and_back;
use crate::combo::{
    ComboAlgo, ComboCore, ComboError, ComboStrategy, LegRole, SpreadSpecs, TrackProfile,
};
use crate::domain::option_position::{OptionRight, PositionSide};

/// Collar strategy.
#[derive(Debug, Default, Clone, Copy)]
pub struct Collar;

impl Collar {
    /// New collar.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ComboStrategy for Collar {
    fn algo(&self) -> ComboAlgo {
        ComboAlgo::Collar
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
        let synthetic = back_chain.atm(price)?;
        let protect = back_chain.strike_below(synthetic)?;
        let cover = front_chain.otm(OptionRight::Call, price)?;

        let long = core.ensure_leg(
            LegRole::SynthLong,
            back,
            synthetic,
            OptionRight::Call,
            PositionSide::Long,
        )?;
        // Financing leg: held until the combo closes.
        core.ensure_leg(
            LegRole::SynthShort,
            back,
            synthetic,
            OptionRight::Put,
            PositionSide::Short,
        )?;
        let cover_id = core.ensure_leg(
            LegRole::Cover,
            front,
            cover,
            OptionRight::Call,
            PositionSide::Short,
        )?;
        let protect_id = core.ensure_leg(
            LegRole::Protect,
            back,
            protect,
            OptionRight::Put,
            PositionSide::Long,
        )?;

        // Synthetic call rolls on expiry only.
        core.init_tracker(long, TrackProfile::long(specs.days_back, Decimal::ZERO))?;
        core.init_track_short_option(cover_id, specs.days_front)?;
        core.init_track_long_option(protect_id, specs.days_back)?;

        info!(%front, %back, %synthetic, %cover, %protect, "Collar initialised");
        Ok(())
    }
}
