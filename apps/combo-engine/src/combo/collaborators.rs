//! External collaborators a combo calls into.
//!
//! All calls are synchronous and made from the combo's owner; results that
//! arrive later (fills, cancels, market data) come back through the combo's
//! `on_*` entry points.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ComboOrder, LegId};
use crate::domain::option_position::{OptionContract, Portfolio, Position};
use crate::domain::shared::{ComboOrderId, PositionId, Symbol};

/// Manual intervention a presentation layer can send back to the combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "command", content = "leg_id", rename_all = "snake_case")]
pub enum LegCommand {
    /// Roll to the next expiry at the same strike.
    CalendarRoll(LegId),
    /// Roll to the next expiry at a new strike.
    DiagonalRoll(LegId),
    /// Suspend tests.
    Lock(LegId),
    /// Resume tests.
    Unlock(LegId),
    /// Close the leg.
    Close(LegId),
}

impl LegCommand {
    /// Target leg.
    #[must_use]
    pub const fn leg_id(&self) -> LegId {
        match self {
            Self::CalendarRoll(id)
            | Self::DiagonalRoll(id)
            | Self::Lock(id)
            | Self::Unlock(id)
            | Self::Close(id) => *id,
        }
    }
}

/// Labelled command offered when an option is activated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuActivation {
    /// Menu label.
    pub label: String,
    /// Command sent back through `Combo::execute`.
    pub command: LegCommand,
}

impl MenuActivation {
    /// Create a menu entry.
    #[must_use]
    pub fn new(label: impl Into<String>, command: LegCommand) -> Self {
        Self {
            label: label.into(),
            command,
        }
    }

    /// Standard menu for a leg.
    #[must_use]
    pub fn standard(leg_id: LegId) -> Vec<Self> {
        vec![
            Self::new("Calendar Roll", LegCommand::CalendarRoll(leg_id)),
            Self::new("Diagonal Roll", LegCommand::DiagonalRoll(leg_id)),
            Self::new("Lock", LegCommand::Lock(leg_id)),
            Self::new("Unlock", LegCommand::Unlock(leg_id)),
            Self::new("Close", LegCommand::Close(leg_id)),
        ]
    }
}

/// Resolve a provider symbol to a tradable contract.
pub type ConstructOptionFn = Box<dyn FnMut(&Symbol) -> Option<OptionContract> + Send>;
/// Announce an active leg with its menu.
pub type ActivateOptionFn =
    Box<dyn FnMut(&OptionContract, &Position, &str, Vec<MenuActivation>) + Send>;
/// Build or reuse a position; the string is the prior leg's note.
pub type ConstructPositionFn = Box<dyn FnMut(&Portfolio, &OptionContract, &str) -> Position + Send>;
/// Announce a leg is no longer active.
pub type DeactivateOptionFn = Box<dyn FnMut(&OptionContract) + Send>;
/// Send an order to the broker.
pub type SubmitOrderFn = Box<dyn FnMut(&ComboOrder) + Send>;
/// Ask the broker to cancel an order.
pub type CancelOrderFn = Box<dyn FnMut(&ComboOrderId) + Send>;

/// Collaborator set stored by `Combo::prepare`.
pub struct Collaborators {
    pub(crate) construct_option: ConstructOptionFn,
    pub(crate) activate_option: ActivateOptionFn,
    pub(crate) construct_position: ConstructPositionFn,
    pub(crate) deactivate_option: DeactivateOptionFn,
    pub(crate) submit_order: SubmitOrderFn,
    pub(crate) cancel_order: CancelOrderFn,
}

impl Default for Collaborators {
    /// OCC decoding, fresh positions, no-op notifications.
    fn default() -> Self {
        Self {
            construct_option: Box::new(|symbol: &Symbol| OptionContract::from_occ(symbol).ok()),
            activate_option: Box::new(
                |_: &OptionContract, _: &Position, _: &str, _: Vec<MenuActivation>| {},
            ),
            construct_position: Box::new(
                |portfolio: &Portfolio, contract: &OptionContract, note: &str| {
                    Position::new(
                        PositionId::generate(),
                        portfolio.id().clone(),
                        contract.clone(),
                    )
                    .with_note(note)
                },
            ),
            deactivate_option: Box::new(|_: &OptionContract| {}),
            submit_order: Box::new(|_: &ComboOrder| {}),
            cancel_order: Box::new(|_: &ComboOrderId| {}),
        }
    }
}

impl Collaborators {
    /// Replace option construction.
    #[must_use]
    pub fn with_construct_option<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Symbol) -> Option<OptionContract> + Send + 'static,
    {
        self.construct_option = Box::new(f);
        self
    }

    /// Replace option activation.
    #[must_use]
    pub fn with_activate_option<F>(mut self, f: F) -> Self
    where
        F: FnMut(&OptionContract, &Position, &str, Vec<MenuActivation>) + Send + 'static,
    {
        self.activate_option = Box::new(f);
        self
    }

    /// Replace position construction.
    #[must_use]
    pub fn with_construct_position<F>(mut self, f: F) -> Self
    where
        F: FnMut(&Portfolio, &OptionContract, &str) -> Position + Send + 'static,
    {
        self.construct_position = Box::new(f);
        self
    }

    /// Replace option deactivation.
    #[must_use]
    pub fn with_deactivate_option<F>(mut self, f: F) -> Self
    where
        F: FnMut(&OptionContract) + Send + 'static,
    {
        self.deactivate_option = Box::new(f);
        self
    }

    /// Replace order submission.
    #[must_use]
    pub fn with_submit_order<F>(mut self, f: F) -> Self
    where
        F: FnMut(&ComboOrder) + Send + 'static,
    {
        self.submit_order = Box::new(f);
        self
    }

    /// Replace order cancellation.
    #[must_use]
    pub fn with_cancel_order<F>(mut self, f: F) -> Self
    where
        F: FnMut(&ComboOrderId) + Send + 'static,
    {
        self.cancel_order = Box::new(f);
        self
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
