//! Shared Domain Types
//!
//! Symbols and strongly-typed identifiers used across the chain and combo
//! modules.

mod identifiers;
mod symbol;

pub use identifiers::{ComboOrderId, PortfolioId, PositionId};
pub use symbol::{Symbol, SymbolError};
