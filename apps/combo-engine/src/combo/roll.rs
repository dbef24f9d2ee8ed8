//! Calendar and diagonal rolls.
//!
//! A roll replaces a leg under the same role without leaving the role
//! vacant: the replacement is constructed and announced before the old leg
//! starts rolling out, and the old leg is erased only after both the close
//! and the open orders are confirmed.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

use super::combo_core::{install_tests, write_note};
use super::{
    ComboCore, ComboError, ComboLeg, ComboOrder, LegId, LegState, LegStateMachine, NoteState,
    OrderLeg, OrderPurpose, OrderSide,
};
use crate::chain::{Chain, ChainError, select_expiry};
use crate::domain::option_position::OptionContract;
use crate::domain::shared::ComboOrderId;
use crate::metrics;

/// How the replacement contract is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollKind {
    /// Same strike, later expiry.
    Calendar,
    /// Re-centred strike, later expiry.
    Diagonal,
}

impl RollKind {
    /// Lowercase label for logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Calendar => "calendar",
            Self::Diagonal => "diagonal",
        }
    }
}

impl fmt::Display for RollKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An in-flight roll: the outgoing leg, its replacement and their orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollPair {
    /// Roll kind.
    pub kind: RollKind,
    /// Leg in `rolling_out`.
    pub old_leg: LegId,
    /// Leg in `rolling_in`.
    pub new_leg: LegId,
    /// State of the old leg before the roll; restored on abort.
    pub prior_state: LegState,
    /// Position note of the old leg before the roll; restored on abort.
    pub prior_note: String,
    /// Order closing the old leg.
    pub close_order: ComboOrderId,
    /// Order opening the new leg.
    pub open_order: ComboOrderId,
    /// Close confirmed.
    pub close_filled: bool,
    /// Open confirmed.
    pub open_filled: bool,
}

impl RollPair {
    fn involves(&self, order_id: &ComboOrderId) -> bool {
        &self.close_order == order_id || &self.open_order == order_id
    }
}

impl ComboCore {
    /// Rolls awaiting confirmation.
    #[must_use]
    pub fn rolls(&self) -> &[RollPair] {
        &self.rolls
    }

    /// Roll a leg to the same strike at the next qualifying expiry.
    ///
    /// # Errors
    ///
    /// Returns `LegNotFound`, `OrderOutstanding`, a chain lookup error or
    /// `InvalidTransition` when the leg cannot roll from its state.
    pub fn calendar_roll(&mut self, id: LegId) -> Result<LegId, ComboError> {
        let leg = self.leg(id).ok_or(ComboError::LegNotFound(id))?;
        let (strike, right) = (leg.contract().strike(), leg.contract().right());
        let (_, chain) = self.roll_expiry(leg)?;
        let symbol = chain.name(strike, right)?.clone();

        let contract = self.construct_option(symbol)?;
        self.start_roll(id, RollKind::Calendar, contract)
    }

    /// Roll a leg to the next qualifying expiry at a strike re-centred on
    /// `price`: at the money for long legs, out of the money for short legs.
    ///
    /// # Errors
    ///
    /// As `calendar_roll`.
    pub fn diagonal_roll(&mut self, id: LegId, price: Decimal) -> Result<LegId, ComboError> {
        let leg = self.leg(id).ok_or(ComboError::LegNotFound(id))?;
        let right = leg.contract().right();
        let long = leg.leg().side().is_long();
        let (_, chain) = self.roll_expiry(leg)?;
        let strike = if long {
            chain.atm(price)?
        } else {
            chain.otm(right, price)?
        };
        let symbol = chain.name(strike, right)?.clone();

        let contract = self.construct_option(symbol)?;
        self.start_roll(id, RollKind::Diagonal, contract)
    }

    /// First expiry after the leg's own that also satisfies the role's
    /// tracking horizon.
    fn roll_expiry(&self, leg: &ComboLeg) -> Result<(NaiveDate, &Chain), ComboError> {
        let current = leg.contract().expiration();
        let today = self.today.unwrap_or(current);
        let horizon = self
            .profiles
            .get(&leg.role())
            .and_then(|p| u64::try_from(p.days_to_expiry).ok())
            .and_then(|days| today.checked_add_days(Days::new(days)))
            .unwrap_or(today);
        let after = current.succ_opt().ok_or(ChainError::NoExpiry {
            after: current,
            min_days: 1,
        })?;
        Ok(select_expiry(&self.chains, after.max(horizon), 0)?)
    }

    fn start_roll(
        &mut self,
        id: LegId,
        kind: RollKind,
        contract: OptionContract,
    ) -> Result<LegId, ComboError> {
        if self.has_pending_order(id) {
            return Err(ComboError::OrderOutstanding(id));
        }
        let old = self.leg(id).ok_or(ComboError::LegNotFound(id))?;
        let (role, side, state) = (old.role(), old.leg().side(), old.state());
        let quantity = if old.position().is_open() {
            old.position().quantity().abs()
        } else {
            old.leg().quantity()
        };
        let prior_note = old.position().note().to_string();
        LegStateMachine::validate_transition(state, LegState::RollingOut)?;
        if self.role_occupancy(role) != 1 {
            return Err(ComboError::RoleOccupied { role });
        }

        let mut new_leg = self.build_leg(role, contract, side, quantity, &prior_note)?;
        new_leg.transition(LegState::RollingIn)?;
        if let Some(profile) = self.profiles.get(&role).copied() {
            install_tests(&mut new_leg, profile, &self.config);
        }
        let underlying = self.last_price.unwrap_or_default();
        let open_leg = order_leg(&new_leg, OrderSide::opening(side), quantity, underlying);
        let new_symbol = new_leg.contract().symbol().clone();

        let old = self.find_mut(id)?;
        old.transition(LegState::RollingOut)?;
        let close_leg = order_leg(old, OrderSide::closing(side), quantity, underlying);
        let old_symbol = old.contract().symbol().clone();

        let new_id = match self.insert_leg(new_leg) {
            Ok(new_id) => new_id,
            Err(e) => {
                self.find_mut(id)?.transition(state)?;
                return Err(e);
            }
        };

        let close_order = self.submit(ComboOrder::new(OrderPurpose::RollClose, vec![close_leg]));
        let open_order = self.submit(ComboOrder::new(OrderPurpose::RollOpen, vec![open_leg]));
        info!(
            %kind,
            %role,
            old_leg = %id,
            new_leg = %new_id,
            from = %old_symbol,
            to = %new_symbol,
            "Roll started"
        );
        metrics::record_roll(kind.as_str(), "started");
        self.rolls.push(RollPair {
            kind,
            old_leg: id,
            new_leg: new_id,
            prior_state: state,
            prior_note,
            close_order,
            open_order,
            close_filled: false,
            open_filled: false,
        });
        Ok(new_id)
    }

    /// Record a confirmed roll order; completes the roll once both sides
    /// are confirmed.
    pub(super) fn roll_filled(&mut self, order_id: &ComboOrderId) -> Result<(), ComboError> {
        let Some(index) = self.rolls.iter().position(|r| r.involves(order_id)) else {
            warn!(%order_id, "Fill for unknown roll");
            return Ok(());
        };
        let pair = &mut self.rolls[index];
        if &pair.close_order == order_id {
            pair.close_filled = true;
        } else {
            pair.open_filled = true;
        }
        if !(pair.close_filled && pair.open_filled) {
            return Ok(());
        }

        let pair = self.rolls.remove(index);
        let algo = self.algo;
        let new_leg = self.find_mut(pair.new_leg)?;
        new_leg.transition(LegState::Tracking)?;
        write_note(algo, new_leg, NoteState::Open);
        self.retire(pair.old_leg, NoteState::Closed)?;

        info!(
            kind = %pair.kind,
            old_leg = %pair.old_leg,
            new_leg = %pair.new_leg,
            "Roll completed"
        );
        metrics::record_roll(pair.kind.as_str(), "completed");
        Ok(())
    }

    /// Unwind after a roll order was cancelled.
    ///
    /// With nothing filled the roll is aborted and the old leg resumes
    /// tracking. A filled close leaves the replacement `loaded`; a filled
    /// open promotes the replacement and leaves the old leg rolling out
    /// for an explicit close.
    pub(super) fn roll_cancelled(&mut self, order_id: &ComboOrderId) -> Result<(), ComboError> {
        let Some(index) = self.rolls.iter().position(|r| r.involves(order_id)) else {
            warn!(%order_id, "Cancel for unknown roll");
            return Ok(());
        };
        let pair = self.rolls.remove(index);
        let close_cancelled = &pair.close_order == order_id;
        let algo = self.algo;

        let outcome = match (close_cancelled, pair.close_filled, pair.open_filled) {
            (true, _, true) => {
                let new_leg = self.find_mut(pair.new_leg)?;
                new_leg.transition(LegState::Tracking)?;
                write_note(algo, new_leg, NoteState::Open);
                "open_only"
            }
            (false, true, _) => {
                self.retire(pair.old_leg, NoteState::Closed)?;
                let new_leg = self.find_mut(pair.new_leg)?;
                new_leg.transition(LegState::Loaded)?;
                "close_only"
            }
            (true, _, false) | (false, false, _) => {
                let partner = if close_cancelled {
                    &pair.open_order
                } else {
                    &pair.close_order
                };
                self.withdraw(partner);
                self.retire(pair.new_leg, NoteState::Vacant)?;
                let old_leg = self.find_mut(pair.old_leg)?;
                old_leg.transition(pair.prior_state)?;
                old_leg.position_mut().set_note(pair.prior_note.clone());
                "aborted"
            }
        };

        info!(
            kind = %pair.kind,
            old_leg = %pair.old_leg,
            new_leg = %pair.new_leg,
            outcome,
            "Roll cancelled"
        );
        metrics::record_roll(pair.kind.as_str(), outcome);
        Ok(())
    }
}

/// Order line for `quantity` of a leg's contract at its mark, intrinsic
/// value when unquoted.
pub(super) fn order_leg(
    leg: &ComboLeg,
    side: OrderSide,
    quantity: Decimal,
    underlying: Decimal,
) -> OrderLeg {
    let price = leg
        .tracker()
        .mark()
        .unwrap_or_else(|| leg.contract().intrinsic(underlying));
    OrderLeg {
        leg_id: leg.id(),
        symbol: leg.contract().symbol().clone(),
        side,
        quantity,
        price,
    }
}
