//! Combo order book: submission, fills, cancels and closes.

use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::combo_core::write_note;
use super::roll::order_leg;
use super::{
    ComboCore, ComboError, ComboLeg, ComboOrder, LegId, LegState, LegStateMachine, NoteState,
    OrderPurpose, OrderSide,
};
use crate::domain::shared::ComboOrderId;
use crate::metrics;

impl ComboCore {
    /// Outstanding orders.
    pub fn orders(&self) -> impl Iterator<Item = &ComboOrder> {
        self.orders.values()
    }

    /// Outstanding order by id.
    #[must_use]
    pub fn order(&self, id: &ComboOrderId) -> Option<&ComboOrder> {
        self.orders.get(id)
    }

    /// Whether any order is outstanding.
    #[must_use]
    pub fn are_orders_active(&self) -> bool {
        !self.orders.is_empty()
    }

    /// Whether an outstanding order involves the leg.
    #[must_use]
    pub fn has_pending_order(&self, leg_id: LegId) -> bool {
        self.orders.values().any(|o| o.involves(leg_id))
    }

    pub(super) fn pending_legs(&self) -> HashSet<LegId> {
        self.orders
            .values()
            .flat_map(|o| o.legs().iter().map(|l| l.leg_id))
            .collect()
    }

    pub(super) fn submit(&mut self, order: ComboOrder) -> ComboOrderId {
        (self.collaborators.submit_order)(&order);
        let id = order.id().clone();
        info!(
            order_id = %id,
            purpose = %order.purpose(),
            legs = order.legs().len(),
            premium = %order.net_premium(),
            "Combo order submitted"
        );
        metrics::record_combo_order(order.purpose().as_str(), "submitted");
        self.orders.insert(id.clone(), order);
        metrics::update_active_orders(self.orders.len());
        id
    }

    /// Cancel an order with the broker and forget it.
    pub(super) fn withdraw(&mut self, id: &ComboOrderId) {
        if let Some(order) = self.orders.remove(id) {
            (self.collaborators.cancel_order)(id);
            debug!(order_id = %id, purpose = %order.purpose(), "Combo order withdrawn");
            metrics::record_combo_order(order.purpose().as_str(), "cancelled");
            metrics::update_active_orders(self.orders.len());
        }
    }

    /// Order every flat `loaded` leg open.
    ///
    /// `Buy` opens each leg on its own side, `Sell` on the opposite side;
    /// `quantity` multiplies each leg's ratio.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` or `NoLegs` when nothing is ready to open.
    pub fn place_order(
        &mut self,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<ComboOrderId, ComboError> {
        if quantity <= Decimal::ZERO {
            return Err(ComboError::InvalidQuantity(quantity));
        }
        let pending = self.pending_legs();
        let underlying = self.last_price.unwrap_or_default();

        let mut lines = Vec::new();
        for leg in self.legs.values_mut().flatten() {
            if leg.state() != LegState::Loaded
                || leg.position().is_open()
                || pending.contains(&leg.id())
            {
                continue;
            }
            let planned = leg.planned();
            let leg_side = match side {
                OrderSide::Buy => planned.side(),
                OrderSide::Sell => planned.side().opposite(),
            };
            let size = planned.quantity() * quantity;
            leg.set_intent(leg_side, size);
            lines.push(order_leg(
                leg,
                OrderSide::opening(leg_side),
                leg.leg().quantity(),
                underlying,
            ));
        }
        if lines.is_empty() {
            return Err(ComboError::NoLegs("open"));
        }
        Ok(self.submit(ComboOrder::new(OrderPurpose::Open, lines)))
    }

    /// Close one leg.
    ///
    /// # Errors
    ///
    /// Returns `LegNotFound`, `OrderOutstanding` or `InvalidTransition`.
    pub fn leg_close(&mut self, id: LegId) -> Result<Option<ComboOrderId>, ComboError> {
        if self.has_pending_order(id) {
            return Err(ComboError::OrderOutstanding(id));
        }
        self.close_legs(&[id])
    }

    /// Close the given legs in one order.
    ///
    /// Flat legs are retired at once; the rest move to `closing`. Legs with
    /// outstanding orders are skipped. Returns the close order, if any.
    ///
    /// # Errors
    ///
    /// Returns `LegNotFound` or `InvalidTransition`; no leg changes state
    /// when any leg cannot close.
    pub fn close_legs(&mut self, ids: &[LegId]) -> Result<Option<ComboOrderId>, ComboError> {
        let pending = self.pending_legs();
        let mut flat = Vec::new();
        let mut held = Vec::new();
        for &id in ids {
            if pending.contains(&id) {
                debug!(leg_id = %id, "Close skipped, order outstanding");
                continue;
            }
            let leg = self.leg(id).ok_or(ComboError::LegNotFound(id))?;
            if leg.position().is_open() {
                LegStateMachine::validate_transition(leg.state(), LegState::Closing)?;
                held.push(id);
            } else {
                LegStateMachine::validate_transition(leg.state(), LegState::Done)?;
                flat.push(id);
            }
        }

        for id in flat {
            self.retire(id, NoteState::Closed)?;
        }

        let underlying = self.last_price.unwrap_or_default();
        let mut lines = Vec::with_capacity(held.len());
        for id in held {
            let leg = self.find_mut(id)?;
            leg.transition(LegState::Closing)?;
            let quantity = leg.position().quantity();
            let side = if quantity.is_sign_positive() {
                OrderSide::Sell
            } else {
                OrderSide::Buy
            };
            lines.push(order_leg(leg, side, quantity.abs(), underlying));
        }
        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.submit(ComboOrder::new(OrderPurpose::Close, lines))))
    }

    /// Close every live leg without an outstanding order.
    ///
    /// # Errors
    ///
    /// As `close_legs`.
    pub fn close_positions(&mut self) -> Result<Option<ComboOrderId>, ComboError> {
        let ids: Vec<LegId> = self
            .legs()
            .filter(|l| l.state().is_live() && l.state() != LegState::Closing)
            .map(|l| l.id())
            .collect();
        info!(legs = ids.len(), "Closing all positions");
        self.close_legs(&ids)
    }

    /// Cancel every outstanding order and unwind the legs behind them.
    ///
    /// # Errors
    ///
    /// Returns the first unwind error.
    pub fn cancel_orders(&mut self) -> Result<usize, ComboError> {
        let ids: Vec<ComboOrderId> = self.orders.keys().cloned().collect();
        let mut cancelled = 0;
        for id in ids {
            // Aborting a roll withdraws its partner order.
            if !self.orders.contains_key(&id) {
                continue;
            }
            (self.collaborators.cancel_order)(&id);
            self.on_order_cancelled(&id)?;
            cancelled += 1;
        }
        Ok(cancelled)
    }

    /// Apply a broker fill for an outstanding order.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOrder`, `Position` for a mismatched fill or a leg
    /// transition error.
    pub fn on_order_filled(&mut self, id: &ComboOrderId) -> Result<(), ComboError> {
        let order = self
            .orders
            .remove(id)
            .ok_or_else(|| ComboError::UnknownOrder(id.clone()))?;
        metrics::record_combo_order(order.purpose().as_str(), "filled");
        metrics::update_active_orders(self.orders.len());
        info!(
            order_id = %id,
            purpose = %order.purpose(),
            legs = order.legs().len(),
            "Combo order filled"
        );

        for line in order.legs() {
            match self.leg_mut(line.leg_id) {
                Some(leg) => {
                    leg.position_mut()
                        .apply_fill_for(&line.symbol, line.signed_quantity(), line.price)?;
                }
                None => warn!(order_id = %id, leg_id = %line.leg_id, "Fill for missing leg"),
            }
        }

        let algo = self.algo;
        match order.purpose() {
            OrderPurpose::Open => {
                for line in order.legs() {
                    if let Some(leg) = self.leg_mut(line.leg_id) {
                        write_note(algo, leg, NoteState::Open);
                    }
                }
            }
            OrderPurpose::Close => {
                for line in order.legs() {
                    let Some(leg) = self.leg_mut(line.leg_id) else {
                        continue;
                    };
                    if leg.state() != LegState::Closing {
                        continue;
                    }
                    if leg.position().is_open() {
                        leg.transition(resume_state(leg))?;
                    } else {
                        self.retire(line.leg_id, NoteState::Closed)?;
                    }
                }
            }
            OrderPurpose::RollClose | OrderPurpose::RollOpen => self.roll_filled(id)?,
        }
        Ok(())
    }

    /// Apply a broker cancel for an outstanding order.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOrder` or a leg transition error.
    pub fn on_order_cancelled(&mut self, id: &ComboOrderId) -> Result<(), ComboError> {
        let order = self
            .orders
            .remove(id)
            .ok_or_else(|| ComboError::UnknownOrder(id.clone()))?;
        metrics::record_combo_order(order.purpose().as_str(), "cancelled");
        metrics::update_active_orders(self.orders.len());
        info!(order_id = %id, purpose = %order.purpose(), "Combo order cancelled");

        match order.purpose() {
            OrderPurpose::Open => {
                for line in order.legs() {
                    if let Some(leg) = self.leg_mut(line.leg_id) {
                        if !leg.position().is_open() {
                            leg.reset_intent();
                        }
                    }
                }
            }
            OrderPurpose::Close => {
                for line in order.legs() {
                    if let Some(leg) = self.leg_mut(line.leg_id) {
                        if leg.state() == LegState::Closing {
                            leg.transition(resume_state(leg))?;
                        }
                    }
                }
            }
            OrderPurpose::RollClose | OrderPurpose::RollOpen => self.roll_cancelled(id)?,
        }
        Ok(())
    }
}

/// Where a leg goes when a close leaves it holding a position.
fn resume_state(leg: &ComboLeg) -> LegState {
    if leg.test_count() > 0 {
        LegState::Tracking
    } else {
        LegState::Loaded
    }
}
