//! Integration tests for calendar and diagonal rolls.

mod common;

use combo_engine::combo::{
    Combo, LegAction, LegCommand, LegId, LegNote, LegRole, LegState, LockDirection, NoteState,
    OrderPurpose, OrderSide, RollKind,
};
use combo_engine::domain::option_position::{Greeks, OptionRight, PositionSide};
use combo_engine::domain::shared::ComboOrderId;
use common::{Event, PRICE, Recorder, at, date, single};
use proptest::prelude::*;
use rust_decimal_macros::dec;

/// A filled, tracking short call under `Cover`.
fn tracking_cover(recorder: &Recorder) -> (Combo, LegId) {
    let mut combo = single(LegRole::Cover, PositionSide::Short, true, recorder);
    let leg_id = combo.core().live_leg(LegRole::Cover).unwrap().id();
    let open = combo.place_order(OrderSide::Buy, dec!(1)).unwrap();
    combo.on_order_filled(&open).unwrap();
    assert!(combo.tick(dec!(0), PRICE, at(2, 15)).is_empty());
    assert_eq!(combo.core().leg(leg_id).unwrap().state(), LegState::Tracking);
    (combo, leg_id)
}

fn roll_orders(combo: &Combo) -> (ComboOrderId, ComboOrderId, LegId) {
    let pair = &combo.core().rolls()[0];
    (pair.close_order.clone(), pair.open_order.clone(), pair.new_leg)
}

#[test]
fn test_calendar_roll_keeps_strike_and_moves_expiry() {
    let recorder = Recorder::default();
    let (mut combo, old) = tracking_cover(&recorder);

    combo.execute(LegCommand::CalendarRoll(old)).unwrap();
    let (close, open, new) = roll_orders(&combo);
    assert_eq!(combo.core().rolls()[0].kind, RollKind::Calendar);

    let core = combo.core();
    assert_eq!(core.leg(old).unwrap().state(), LegState::RollingOut);
    assert_eq!(core.leg(new).unwrap().state(), LegState::RollingIn);
    assert_eq!(core.role_occupancy(LegRole::Cover), 2);
    let (from, to) = (core.leg(old).unwrap().contract(), core.leg(new).unwrap().contract());
    assert_eq!(from.strike(), to.strike());
    assert_eq!(to.expiration(), date(2025, 1, 17));
    assert_eq!(core.order(&close).unwrap().purpose(), OrderPurpose::RollClose);
    assert_eq!(core.order(&open).unwrap().legs()[0].side, OrderSide::Sell);
}

#[test]
fn test_old_leg_survives_until_both_sides_fill() {
    let recorder = Recorder::default();
    let (mut combo, old) = tracking_cover(&recorder);
    combo.execute(LegCommand::CalendarRoll(old)).unwrap();
    let (close, open, new) = roll_orders(&combo);

    combo.on_order_filled(&close).unwrap();
    assert_eq!(combo.core().leg(old).unwrap().state(), LegState::RollingOut);
    assert!(!combo.core().leg(old).unwrap().position().is_open());
    assert_eq!(combo.core().role_occupancy(LegRole::Cover), 2);

    combo.on_order_filled(&open).unwrap();
    assert!(combo.core().leg(old).is_none());
    assert_eq!(combo.core().leg(new).unwrap().state(), LegState::Tracking);
    assert_eq!(combo.core().role_occupancy(LegRole::Cover), 1);
    assert!(combo.core().rolls().is_empty());
    assert_eq!(combo.core().leg(new).unwrap().test_count(), 4);

    // The replacement is announced before the outgoing leg is withdrawn.
    let events = recorder.events();
    let activated = events
        .iter()
        .rposition(|e| matches!(e, Event::Activated(_)))
        .unwrap();
    let deactivated = events
        .iter()
        .position(|e| matches!(e, Event::Deactivated(_)))
        .unwrap();
    assert!(activated < deactivated);
    assert!(recorder.shown().iter().all(|&shown| shown >= 1));
}

#[test]
fn test_cancel_with_nothing_filled_aborts_roll() {
    let recorder = Recorder::default();
    let (mut combo, old) = tracking_cover(&recorder);
    combo.execute(LegCommand::CalendarRoll(old)).unwrap();
    let (close, open, new) = roll_orders(&combo);

    combo.on_order_cancelled(&open).unwrap();
    assert!(combo.core().leg(new).is_none());
    assert_eq!(combo.core().leg(old).unwrap().state(), LegState::Tracking);
    assert!(!combo.are_orders_active());
    assert!(recorder.events().contains(&Event::Cancelled(close)));
}

#[test]
fn test_aborted_roll_of_locked_leg_stays_locked() {
    let recorder = Recorder::default();
    let (mut combo, old) = tracking_cover(&recorder);
    combo.execute(LegCommand::Lock(old)).unwrap();
    let locked_note = combo.core().leg(old).unwrap().position().note().to_string();

    combo.execute(LegCommand::CalendarRoll(old)).unwrap();
    assert_eq!(combo.core().leg(old).unwrap().state(), LegState::RollingOut);
    assert_eq!(combo.cancel_orders().unwrap(), 1);

    let leg = combo.core().leg(old).unwrap();
    assert_eq!(leg.state(), LegState::Locked);
    assert_eq!(leg.position().note(), locked_note);
    let note: LegNote = leg.position().note().parse().unwrap();
    assert_eq!(note.state, NoteState::Locked);
    assert_eq!(note.lock, Some(LockDirection::Up));
    assert_eq!(combo.core().role_occupancy(LegRole::Cover), 1);
    assert!(combo.core().rolls().is_empty());
}

#[test]
fn test_cancelled_open_after_filled_close_loads_replacement() {
    let recorder = Recorder::default();
    let (mut combo, old) = tracking_cover(&recorder);
    combo.execute(LegCommand::CalendarRoll(old)).unwrap();
    let (close, open, new) = roll_orders(&combo);

    combo.on_order_filled(&close).unwrap();
    combo.on_order_cancelled(&open).unwrap();
    assert!(combo.core().leg(old).is_none());
    assert_eq!(combo.core().leg(new).unwrap().state(), LegState::Loaded);
    assert_eq!(combo.core().role_occupancy(LegRole::Cover), 1);

    // The replacement can be reopened.
    let reopen = combo.place_order(OrderSide::Buy, dec!(1)).unwrap();
    assert!(combo.core().order(&reopen).unwrap().involves(new));
}

#[test]
fn test_cancelled_close_after_filled_open_keeps_old_leg_for_close() {
    let recorder = Recorder::default();
    let (mut combo, old) = tracking_cover(&recorder);
    combo.execute(LegCommand::CalendarRoll(old)).unwrap();
    let (close, open, new) = roll_orders(&combo);

    combo.on_order_filled(&open).unwrap();
    combo.on_order_cancelled(&close).unwrap();
    assert_eq!(combo.core().leg(new).unwrap().state(), LegState::Tracking);
    assert_eq!(combo.core().leg(old).unwrap().state(), LegState::RollingOut);

    let order = combo.close_positions().unwrap().unwrap();
    assert_eq!(combo.core().order(&order).unwrap().legs().len(), 2);
    assert_eq!(combo.core().leg(old).unwrap().state(), LegState::Closing);
}

#[test]
fn test_delta_trigger_rolls_diagonally() {
    let recorder = Recorder::default();
    let (mut combo, old) = tracking_cover(&recorder);
    let symbol = combo.core().leg(old).unwrap().contract().symbol().clone();
    combo.on_greeks(&symbol, Greeks::with_delta(dec!(0.45)), dec!(0.18), at(2, 16));

    let triggered = combo.tick(dec!(0), dec!(103), at(2, 16));
    assert_eq!(triggered, vec![(old, LegAction::DiagonalRoll)]);

    let pair = &combo.core().rolls()[0];
    assert_eq!(pair.kind, RollKind::Diagonal);
    let new = combo.core().leg(pair.new_leg).unwrap().contract();
    assert_eq!(new.strike(), dec!(104));
    assert_eq!(new.expiration(), date(2025, 1, 17));

    // Rolling legs keep testing, but nothing is acted on.
    assert!(combo.tick(dec!(0), dec!(103), at(2, 17)).is_empty());
    assert_eq!(combo.core().rolls().len(), 1);
}

#[test]
fn test_roll_without_later_expiry_fails_cleanly() {
    let recorder = Recorder::default();
    let mut combo = single(LegRole::Back, PositionSide::Long, true, &recorder);
    let leg_id = combo.core().live_leg(LegRole::Back).unwrap().id();
    let far = combo
        .core_mut()
        .open_leg(
            LegRole::Protect,
            date(2025, 2, 21),
            dec!(99),
            OptionRight::Put,
            PositionSide::Long,
        )
        .unwrap();
    let open = combo.place_order(OrderSide::Buy, dec!(1)).unwrap();
    combo.on_order_filled(&open).unwrap();
    combo.core_mut().init_track_long_option(far, 30).unwrap();
    combo.tick(dec!(0), PRICE, at(2, 15));

    assert!(combo.execute(LegCommand::CalendarRoll(far)).is_err());
    assert_eq!(combo.core().leg(far).unwrap().state(), LegState::Tracking);
    assert_eq!(combo.core().leg(leg_id).unwrap().state(), LegState::Tracking);
    assert!(!combo.are_orders_active());
}

proptest! {
    #[test]
    fn role_is_never_vacant_during_roll(events in prop::collection::vec(0u8..4, 1..5)) {
        let recorder = Recorder::default();
        let (mut combo, old) = tracking_cover(&recorder);
        combo.execute(LegCommand::CalendarRoll(old)).unwrap();
        let (close, open, _) = roll_orders(&combo);

        for event in events {
            let _ = match event {
                0 => combo.on_order_filled(&close),
                1 => combo.on_order_filled(&open),
                2 => combo.on_order_cancelled(&close),
                _ => combo.on_order_cancelled(&open),
            };
            prop_assert!(combo.core().role_occupancy(LegRole::Cover) >= 1);
        }
        prop_assert!(recorder.shown().iter().all(|&shown| shown >= 1));
    }
}
