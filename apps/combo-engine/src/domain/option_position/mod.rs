//! Option Position Bounded Context
//!
//! This module handles the instrument and position side of a combo:
//! - Option contracts and their moneyness relative to the underlying
//! - Legs (side and quantity intent for one contract)
//! - Positions filled against a leg and the portfolio they roll up to
//! - Greeks reported by the external pricing collaborator

pub mod errors;
pub mod value_objects;

pub use errors::OptionPositionError;
pub use value_objects::{
    Greeks, Leg, OptionContract, OptionRight, Portfolio, Position, PositionSide,
};
