//! Combo errors.

use thiserror::Error;

use super::{LegId, LegNoteError, LegRole, LegState};
use crate::chain::ChainError;
use crate::domain::option_position::OptionPositionError;
use crate::domain::shared::{ComboOrderId, Symbol};

/// Errors raised by combo orchestration.
#[derive(Debug, Error)]
pub enum ComboError {
    /// Leg state transition is not allowed.
    #[error("Invalid leg transition from {from} to {to}: {reason}")]
    InvalidTransition {
        /// Current state.
        from: LegState,
        /// Requested state.
        to: LegState,
        /// Human-readable reason.
        reason: String,
    },

    /// Role already holds a live leg.
    #[error("Role {role} already holds a live leg")]
    RoleOccupied {
        /// Occupied role.
        role: LegRole,
    },

    /// No leg with this id.
    #[error("Leg not found: {0}")]
    LegNotFound(LegId),

    /// Order is not outstanding.
    #[error("Unknown combo order: {0}")]
    UnknownOrder(ComboOrderId),

    /// Leg already belongs to an unconfirmed order.
    #[error("Leg {0} has an order outstanding")]
    OrderOutstanding(LegId),

    /// Option construction collaborator could not resolve a symbol.
    #[error("Option unavailable: {0}")]
    OptionUnavailable(Symbol),

    /// Quantity must be positive.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(rust_decimal::Decimal),

    /// No leg is in a state the operation applies to.
    #[error("No legs to {0}")]
    NoLegs(&'static str),

    /// Collaborators or portfolio are missing.
    #[error("Combo not prepared: {0}")]
    NotPrepared(&'static str),

    /// Strategy cannot be built from the supplied chains.
    #[error("Strategy init failed: {0}")]
    Init(String),

    /// Chain lookup failed.
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// Position note could not be decoded.
    #[error(transparent)]
    Note(#[from] LegNoteError),

    /// Position update failed.
    #[error(transparent)]
    Position(#[from] OptionPositionError),
}
