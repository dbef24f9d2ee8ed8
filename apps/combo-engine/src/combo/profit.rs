//! Profit taking, in-the-money exits and expiry handling.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use super::{ComboCore, ComboError, ComboLeg, LegId, LegState, NoteState};
use crate::domain::shared::ComboOrderId;

impl ComboCore {
    /// Ids of legs that may be closed and satisfy `keep`.
    fn closable<F>(&self, mut keep: F) -> Vec<LegId>
    where
        F: FnMut(&ComboLeg) -> bool,
    {
        self.legs()
            .filter(|l| {
                matches!(
                    l.state(),
                    LegState::Loaded | LegState::Tracking | LegState::Locked
                )
            })
            .filter(|l| l.position().is_open() && !self.has_pending_order(l.id()))
            .filter(|l| keep(*l))
            .map(|l| l.id())
            .collect()
    }

    /// Deepest in-the-money closable leg satisfying `keep`.
    fn deepest_itm<F>(&self, price: Decimal, mut keep: F) -> Option<LegId>
    where
        F: FnMut(&ComboLeg) -> bool,
    {
        let ids = self.closable(|l| l.contract().is_itm(price) && keep(l));
        ids.into_iter().max_by_key(|id| {
            self.leg(*id)
                .map_or(Decimal::ZERO, |l| l.contract().itm_amount(price))
        })
    }

    /// Close legs that reached the take-profit fraction of their premium.
    ///
    /// # Errors
    ///
    /// As `close_legs`.
    pub fn take_profits(&mut self) -> Result<Option<ComboOrderId>, ComboError> {
        let target = self.config.take_profit_fraction;
        let ids = self.closable(|l| l.view().profit_fraction().is_some_and(|p| p >= target));
        if ids.is_empty() {
            return Ok(None);
        }
        info!(legs = ids.len(), %target, "Taking profits");
        self.close_legs(&ids)
    }

    /// Close in-the-money legs expiring on or before `date`.
    ///
    /// # Errors
    ///
    /// As `close_legs`.
    pub fn close_expiry_itm(
        &mut self,
        price: Decimal,
        date: NaiveDate,
    ) -> Result<Option<ComboOrderId>, ComboError> {
        let ids =
            self.closable(|l| l.contract().expiration() <= date && l.contract().is_itm(price));
        if ids.is_empty() {
            return Ok(None);
        }
        info!(legs = ids.len(), %price, %date, "Closing expiring in-the-money legs");
        self.close_legs(&ids)
    }

    /// Close legs in the money by more than the configured fraction of `price`.
    ///
    /// # Errors
    ///
    /// As `close_legs`.
    pub fn close_far_itm(&mut self, price: Decimal) -> Result<Option<ComboOrderId>, ComboError> {
        let limit = price * self.config.far_itm_fraction;
        let ids = self.closable(|l| l.contract().itm_amount(price) > limit);
        if ids.is_empty() {
            return Ok(None);
        }
        info!(legs = ids.len(), %price, %limit, "Closing far in-the-money legs");
        self.close_legs(&ids)
    }

    /// Close the deepest in-the-money leg; returns whether one was closed.
    ///
    /// # Errors
    ///
    /// As `close_legs`.
    pub fn close_itm_leg(&mut self, price: Decimal) -> Result<bool, ComboError> {
        let Some(id) = self.deepest_itm(price, |_| true) else {
            return Ok(false);
        };
        info!(leg_id = %id, %price, "Closing in-the-money leg");
        self.close_legs(&[id])?;
        Ok(true)
    }

    /// Close the deepest in-the-money leg showing a profit at its mark.
    ///
    /// # Errors
    ///
    /// As `close_legs`.
    pub fn close_itm_leg_for_profit(&mut self, price: Decimal) -> Result<bool, ComboError> {
        let profitable = |l: &ComboLeg| {
            let mark = l
                .tracker()
                .mark()
                .unwrap_or_else(|| l.contract().intrinsic(price));
            l.position().unrealized_pnl(mark) > Decimal::ZERO
        };
        let Some(id) = self.deepest_itm(price, profitable) else {
            return Ok(false);
        };
        info!(leg_id = %id, %price, "Closing profitable in-the-money leg");
        self.close_legs(&[id])?;
        Ok(true)
    }

    /// Flatten legs expiring on or before `date`.
    ///
    /// # Errors
    ///
    /// As `close_legs`.
    pub fn go_neutral(&mut self, date: NaiveDate) -> Result<Option<ComboOrderId>, ComboError> {
        let ids = self.closable(|l| l.contract().expiration() <= date);
        if ids.is_empty() {
            return Ok(None);
        }
        info!(legs = ids.len(), %date, "Going neutral on expiring legs");
        self.close_legs(&ids)
    }

    /// End-of-session bookkeeping: retire legs whose contracts expire by
    /// `date`. Returns the number retired.
    ///
    /// # Errors
    ///
    /// Returns a leg transition error.
    pub fn at_close(&mut self, date: NaiveDate) -> Result<usize, ComboError> {
        let expired: Vec<LegId> = self
            .legs()
            .filter(|l| {
                l.state().is_live()
                    && !l.state().is_rolling()
                    && l.state() != LegState::Closing
                    && l.contract().expiration() <= date
                    && !self.has_pending_order(l.id())
            })
            .map(|l| l.id())
            .collect();
        for &id in &expired {
            self.retire(id, NoteState::Expired)?;
        }
        if !expired.is_empty() {
            info!(legs = expired.len(), %date, "Expired legs retired");
        }
        Ok(expired.len())
    }
}
