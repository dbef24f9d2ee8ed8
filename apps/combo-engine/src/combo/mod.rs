//! Multi-leg option combos.
//!
//! A combo holds one leg per role (synthetic long, cover, front, back, ...).
//! Each leg moves through [`LegState`] driven by its ordered tests, its
//! orders and the roll protocol. The strategy chooses contracts; the
//! [`ComboCore`] keeps the role map, the order book and the chart output.
//!
//! # Ticks
//!
//! On every underlying update, `loaded` legs with tests and a filled
//! position start tracking, every tracked or rolling leg runs all of its
//! tests, and the first triggered test of a `tracking` leg decides its
//! disposition: roll, lock or close.
//!
//! # Rolls
//!
//! A role is never vacant while a roll is in flight. The replacement leg
//! is constructed and activated first, and the outgoing leg is erased only
//! once both the closing and opening orders are confirmed.

mod book;
mod chart;
mod collaborators;
mod combo_leg;
mod combo_core;
mod driver;
mod error;
mod leg_note;
mod leg_state;
mod order;
mod profit;
mod roll;
mod strategy;
mod tracker;

pub use chart::{ChartPoint, ChartSeries, ChartSink};
pub use collaborators::{
    ActivateOptionFn, CancelOrderFn, Collaborators, ConstructOptionFn, ConstructPositionFn,
    DeactivateOptionFn, LegCommand, MenuActivation, SubmitOrderFn,
};
pub use combo_leg::{ComboLeg, LegAction, LegId, LegTestFn, LegView, Tick};
pub use combo_core::ComboCore;
pub use driver::Combo;
pub use error::ComboError;
pub use leg_note::{ComboAlgo, LegNote, LegNoteError, LegRole, LockDirection, NoteState};
pub use leg_state::{LegState, LegStateMachine};
pub use order::{ComboOrder, OrderLeg, OrderPurpose, OrderSide};
pub use roll::{RollKind, RollPair};
pub use strategy::{ComboStrategy, SpreadSpecs};
pub use tracker::{Quote, TrackProfile, Tracker};
