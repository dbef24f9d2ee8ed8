//! One leg of a combo: position, tracker, and its ordered tests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::{ComboError, LegRole, LegState, LegStateMachine, Tracker};
use crate::domain::option_position::{Leg, OptionContract, Position, PositionSide};
use crate::metrics;

/// Per-combo leg identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LegId(pub u64);

impl fmt::Display for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "leg-{}", self.0)
    }
}

/// Underlying market update fed to `Combo::tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Event time.
    pub time: DateTime<Utc>,
    /// Underlying slope (trend indicator).
    pub slope: Decimal,
    /// Underlying price.
    pub price: Decimal,
}

impl Tick {
    /// Create a tick.
    #[must_use]
    pub const fn new(time: DateTime<Utc>, slope: Decimal, price: Decimal) -> Self {
        Self { time, slope, price }
    }
}

/// Read-only view handed to tests.
#[derive(Debug, Clone, Copy)]
pub struct LegView<'a> {
    /// Leg intent.
    pub leg: &'a Leg,
    /// Live market state.
    pub tracker: &'a Tracker,
    /// Filled position.
    pub position: &'a Position,
}

impl LegView<'_> {
    /// Contract of the leg.
    #[must_use]
    pub const fn contract(&self) -> &OptionContract {
        self.leg.contract()
    }

    /// Unrealized P/L as a fraction of the premium paid or received.
    #[must_use]
    pub fn profit_fraction(&self) -> Option<Decimal> {
        let cost = self.position.cost_basis();
        if cost.is_zero() {
            return None;
        }
        let mark = self.tracker.mark()?;
        Some(self.position.unrealized_pnl(mark) / cost)
    }
}

/// Disposition requested by a triggered test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegAction {
    /// Same strike, later expiry.
    CalendarRoll,
    /// New strike, later expiry.
    DiagonalRoll,
    /// Suspend tests.
    Lock,
    /// Close the leg.
    Close,
}

impl LegAction {
    /// Snake-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CalendarRoll => "calendar_roll",
            Self::DiagonalRoll => "diagonal_roll",
            Self::Lock => "lock",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for LegAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Test predicate; may keep internal state across ticks.
pub type LegTestFn = Box<dyn FnMut(&LegView<'_>, &Tick) -> bool + Send>;

struct LegTest {
    action: LegAction,
    test: LegTestFn,
}

/// One leg of a combo.
///
/// Exclusively owned by its combo; never cloned.
pub struct ComboLeg {
    id: LegId,
    role: LegRole,
    leg: Leg,
    planned: Leg,
    position: Position,
    tracker: Tracker,
    state: LegState,
    tests: Vec<LegTest>,
}

impl ComboLeg {
    /// Start a leg in `opening` around a constructed position.
    #[must_use]
    pub fn opening(id: LegId, role: LegRole, leg: Leg, position: Position) -> Self {
        let tracker = Tracker::new(leg.contract());
        Self {
            id,
            role,
            planned: leg.clone(),
            leg,
            position,
            tracker,
            state: LegState::Opening,
            tests: Vec::new(),
        }
    }

    /// Leg identifier.
    #[must_use]
    pub const fn id(&self) -> LegId {
        self.id
    }

    /// Role within the combo.
    #[must_use]
    pub const fn role(&self) -> LegRole {
        self.role
    }

    /// Leg intent.
    #[must_use]
    pub const fn leg(&self) -> &Leg {
        &self.leg
    }

    /// Contract of the leg.
    #[must_use]
    pub const fn contract(&self) -> &OptionContract {
        self.leg.contract()
    }

    /// Filled position.
    #[must_use]
    pub const fn position(&self) -> &Position {
        &self.position
    }

    /// Mutable position.
    pub const fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    /// Live market state.
    #[must_use]
    pub const fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Mutable live market state.
    pub const fn tracker_mut(&mut self) -> &mut Tracker {
        &mut self.tracker
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LegState {
        self.state
    }

    /// View for tests and valuation.
    #[must_use]
    pub const fn view(&self) -> LegView<'_> {
        LegView {
            leg: &self.leg,
            tracker: &self.tracker,
            position: &self.position,
        }
    }

    /// Intent as the strategy built it, before any order sizing.
    #[must_use]
    pub const fn planned(&self) -> &Leg {
        &self.planned
    }

    /// Replace side and size ahead of the opening order.
    ///
    /// `planned` is left untouched so a cancelled order can be re-sized
    /// from scratch.
    pub(crate) fn set_intent(&mut self, side: PositionSide, quantity: Decimal) {
        self.leg = Leg::new(self.planned.contract().clone(), side, quantity);
    }

    /// Drop order sizing and return to the planned intent.
    pub(crate) fn reset_intent(&mut self) {
        self.leg = self.planned.clone();
    }

    /// Move to `to`, returning the previous state.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if the table forbids it.
    pub fn transition(&mut self, to: LegState) -> Result<LegState, ComboError> {
        LegStateMachine::validate_transition(self.state, to)?;
        let from = std::mem::replace(&mut self.state, to);
        debug!(leg_id = %self.id, role = %self.role, %from, %to, "Leg transition");
        metrics::record_leg_transition(to.as_str());
        if matches!(to, LegState::Done) {
            self.tests.clear();
        }
        Ok(from)
    }

    /// Append a test; tests run in registration order.
    pub fn add_test<F>(&mut self, action: LegAction, test: F)
    where
        F: FnMut(&LegView<'_>, &Tick) -> bool + Send + 'static,
    {
        self.tests.push(LegTest {
            action,
            test: Box::new(test),
        });
    }

    /// Number of registered tests.
    #[must_use]
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    /// Remove every test.
    pub fn clear_tests(&mut self) {
        self.tests.clear();
    }

    /// Run every test against `tick`.
    ///
    /// All tests run even after one triggers; the first triggered test in
    /// registration order decides the action.
    pub fn test(&mut self, tick: &Tick) -> Option<LegAction> {
        let view = LegView {
            leg: &self.leg,
            tracker: &self.tracker,
            position: &self.position,
        };
        let mut triggered = None;
        for entry in &mut self.tests {
            if (entry.test)(&view, tick) && triggered.is_none() {
                triggered = Some(entry.action);
            }
        }
        triggered
    }
}

impl fmt::Debug for ComboLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComboLeg")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("symbol", self.leg.contract().symbol())
            .field("state", &self.state)
            .field("quantity", &self.position.quantity())
            .field("tests", &self.tests.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::option_position::OptionRight;
    use crate::domain::shared::{PortfolioId, PositionId};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn leg() -> ComboLeg {
        let contract = OptionContract::occ(
            "SPY",
            dec!(450),
            NaiveDate::from_ymd_opt(2025, 1, 17).unwrap(),
            OptionRight::Call,
        );
        let position =
            Position::new(PositionId::new("p-1"), PortfolioId::new("pf"), contract.clone());
        ComboLeg::opening(LegId(1), LegRole::LongCall, Leg::long(contract, dec!(1)), position)
    }

    fn tick(price: Decimal) -> Tick {
        Tick::new(Utc::now(), Decimal::ZERO, price)
    }

    #[test]
    fn every_test_runs_and_first_trigger_wins() {
        let mut leg = leg();
        let calls = Arc::new(AtomicUsize::new(0));
        for action in [LegAction::Lock, LegAction::Close, LegAction::CalendarRoll] {
            let calls = Arc::clone(&calls);
            leg.add_test(action, move |_, t| {
                calls.fetch_add(1, Ordering::SeqCst);
                action != LegAction::Lock && t.price > dec!(100)
            });
        }

        assert_eq!(leg.test(&tick(dec!(90))), None);
        assert_eq!(leg.test(&tick(dec!(110))), Some(LegAction::Close));
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn tests_keep_state_between_ticks() {
        let mut leg = leg();
        let mut seen = 0;
        leg.add_test(LegAction::Close, move |_, _| {
            seen += 1;
            seen == 3
        });
        assert_eq!(leg.test(&tick(dec!(1))), None);
        assert_eq!(leg.test(&tick(dec!(1))), None);
        assert_eq!(leg.test(&tick(dec!(1))), Some(LegAction::Close));
    }

    #[test]
    fn done_clears_tests_and_rejects_reuse() {
        let mut leg = leg();
        leg.add_test(LegAction::Close, |_, _| true);
        leg.transition(LegState::Loaded).unwrap();
        leg.transition(LegState::Done).unwrap();

        assert_eq!(leg.test_count(), 0);
        assert!(leg.transition(LegState::Loaded).is_err());
    }

    #[test]
    fn intent_is_sized_from_plan_and_resets() {
        let mut leg = leg();
        leg.set_intent(PositionSide::Short, dec!(3));
        leg.set_intent(PositionSide::Short, dec!(3));
        assert_eq!(leg.leg().side(), PositionSide::Short);
        assert_eq!(leg.leg().quantity(), dec!(3));
        assert_eq!(leg.planned().side(), PositionSide::Long);

        leg.reset_intent();
        assert_eq!(leg.leg(), leg.planned());
    }

    #[test]
    fn profit_fraction_uses_mark_and_cost() {
        let mut leg = leg();
        leg.position_mut().apply_fill(dec!(1), dec!(2));
        assert_eq!(leg.view().profit_fraction(), None);

        leg.tracker_mut().on_quote(
            crate::combo::Quote { bid: dec!(2.9), ask: dec!(3.1) },
            Utc::now(),
        );
        assert_eq!(leg.view().profit_fraction(), Some(dec!(0.5)));
    }
}
