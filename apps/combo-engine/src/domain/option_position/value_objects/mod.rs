//! Option position value objects.

mod greeks;
mod leg;
mod option_contract;
mod portfolio;
mod position;

pub use greeks::Greeks;
pub use leg::{Leg, PositionSide};
pub use option_contract::{OptionContract, OptionRight};
pub use portfolio::Portfolio;
pub use position::Position;
