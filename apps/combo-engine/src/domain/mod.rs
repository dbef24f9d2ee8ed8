//! Domain layer.
//!
//! Value objects shared by the chain aggregator and the combo state machine.
//!
//! - `shared`: symbols
//! - `option_position`: contracts, legs, positions, portfolios, greeks

pub mod option_position;
pub mod shared;
