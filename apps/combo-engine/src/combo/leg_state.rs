//! Leg lifecycle states and the transition table.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ComboError;

/// Lifecycle of one combo leg.
///
/// ```text
/// empty → opening → loaded → {locked, tracking} → {rolling_in, rolling_out} → closing → done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegState {
    /// Placeholder, nothing constructed.
    Empty,
    /// Option and position are being constructed.
    Opening,
    /// Leg constructed, tests not yet evaluated.
    Loaded,
    /// Tests suspended but retained.
    Locked,
    /// Tests evaluated on each tick; position is non-zero.
    Tracking,
    /// New half of a roll, awaiting its opening fill.
    RollingIn,
    /// Old half of a roll, awaiting its closing fill.
    RollingOut,
    /// Closing order outstanding.
    Closing,
    /// Terminal; the leg is only ever destroyed from here.
    Done,
}

impl LegState {
    /// Whether the leg still counts toward its role.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        !matches!(self, Self::Done)
    }

    /// Whether `tick` runs this leg's tests.
    #[must_use]
    pub const fn is_evaluated(&self) -> bool {
        matches!(self, Self::Tracking | Self::RollingIn | Self::RollingOut)
    }

    /// Whether the leg is one half of an unconfirmed roll.
    #[must_use]
    pub const fn is_rolling(&self) -> bool {
        matches!(self, Self::RollingIn | Self::RollingOut)
    }

    /// Snake-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Opening => "opening",
            Self::Loaded => "loaded",
            Self::Locked => "locked",
            Self::Tracking => "tracking",
            Self::RollingIn => "rolling_in",
            Self::RollingOut => "rolling_out",
            Self::Closing => "closing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for LegState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Leg state machine for validating transitions.
pub struct LegStateMachine;

impl LegStateMachine {
    /// Check if a state transition is valid.
    #[must_use]
    pub const fn is_valid_transition(from: LegState, to: LegState) -> bool {
        matches!(
            (from, to),
            // From Empty
            (LegState::Empty, LegState::Opening)
                // From Opening
                | (LegState::Opening, LegState::Loaded)
                | (LegState::Opening, LegState::Done)
                // From Loaded
                | (LegState::Loaded, LegState::Tracking)
                | (LegState::Loaded, LegState::Locked)
                | (LegState::Loaded, LegState::RollingIn)
                | (LegState::Loaded, LegState::Closing)
                | (LegState::Loaded, LegState::Done)
                // From Tracking
                | (LegState::Tracking, LegState::Locked)
                | (LegState::Tracking, LegState::RollingOut)
                | (LegState::Tracking, LegState::Closing)
                | (LegState::Tracking, LegState::Done)
                // From Locked
                | (LegState::Locked, LegState::Tracking)
                | (LegState::Locked, LegState::RollingOut)
                | (LegState::Locked, LegState::Closing)
                | (LegState::Locked, LegState::Done)
                // From RollingIn
                | (LegState::RollingIn, LegState::Tracking)
                | (LegState::RollingIn, LegState::Loaded)
                | (LegState::RollingIn, LegState::Closing)
                | (LegState::RollingIn, LegState::Done)
                // From RollingOut
                | (LegState::RollingOut, LegState::Done)
                | (LegState::RollingOut, LegState::Tracking)
                | (LegState::RollingOut, LegState::Locked)
                | (LegState::RollingOut, LegState::Closing)
                // From Closing
                | (LegState::Closing, LegState::Done)
                | (LegState::Closing, LegState::Tracking)
                | (LegState::Closing, LegState::Loaded)
        )
    }

    /// Validate a state transition.
    ///
    /// # Errors
    ///
    /// Returns error if the transition is invalid.
    pub fn validate_transition(from: LegState, to: LegState) -> Result<(), ComboError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(ComboError::InvalidTransition {
                from,
                to,
                reason: Self::transition_error_reason(from, to),
            })
        }
    }

    /// Get a human-readable reason for an invalid transition.
    #[must_use]
    pub fn transition_error_reason(from: LegState, to: LegState) -> String {
        match from {
            LegState::Done => format!("Leg is done and cannot be reused as {to}"),
            LegState::Empty => format!("Leg was never opened, cannot become {to}"),
            LegState::Opening => format!("Leg is still opening, cannot become {to}"),
            _ => format!("Invalid transition from {from} to {to}"),
        }
    }

    /// Get all valid next states from a given state.
    #[must_use]
    pub fn valid_next_states(from: LegState) -> Vec<LegState> {
        match from {
            LegState::Empty => vec![LegState::Opening],
            LegState::Opening => vec![LegState::Loaded, LegState::Done],
            LegState::Loaded => vec![
                LegState::Tracking,
                LegState::Locked,
                LegState::RollingIn,
                LegState::Closing,
                LegState::Done,
            ],
            LegState::Tracking => vec![
                LegState::Locked,
                LegState::RollingOut,
                LegState::Closing,
                LegState::Done,
            ],
            LegState::Locked => vec![
                LegState::Tracking,
                LegState::RollingOut,
                LegState::Closing,
                LegState::Done,
            ],
            LegState::RollingIn => vec![
                LegState::Tracking,
                LegState::Loaded,
                LegState::Closing,
                LegState::Done,
            ],
            LegState::RollingOut => vec![
                LegState::Done,
                LegState::Tracking,
                LegState::Locked,
                LegState::Closing,
            ],
            LegState::Closing => vec![LegState::Done, LegState::Tracking, LegState::Loaded],
            // Terminal state
            LegState::Done => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const ALL: [LegState; 9] = [
        LegState::Empty,
        LegState::Opening,
        LegState::Loaded,
        LegState::Locked,
        LegState::Tracking,
        LegState::RollingIn,
        LegState::RollingOut,
        LegState::Closing,
        LegState::Done,
    ];

    #[test_case(LegState::Empty, LegState::Opening ; "open")]
    #[test_case(LegState::Opening, LegState::Loaded ; "constructed")]
    #[test_case(LegState::Loaded, LegState::Tracking ; "start tracking")]
    #[test_case(LegState::Loaded, LegState::RollingIn ; "roll partner")]
    #[test_case(LegState::Tracking, LegState::RollingOut ; "roll old leg")]
    #[test_case(LegState::Locked, LegState::Tracking ; "unlock")]
    #[test_case(LegState::RollingIn, LegState::Tracking ; "roll confirmed")]
    #[test_case(LegState::RollingOut, LegState::Done ; "roll retired")]
    #[test_case(LegState::Closing, LegState::Done ; "closed")]
    #[test_case(LegState::Closing, LegState::Loaded ; "partial close of untracked leg")]
    #[test_case(LegState::RollingOut, LegState::Locked ; "aborted roll of locked leg")]
    fn allowed(from: LegState, to: LegState) {
        assert!(LegStateMachine::is_valid_transition(from, to));
        assert!(LegStateMachine::validate_transition(from, to).is_ok());
    }

    #[test_case(LegState::Empty, LegState::Tracking ; "skip construction")]
    #[test_case(LegState::Loaded, LegState::RollingOut ; "roll untracked leg")]
    #[test_case(LegState::Tracking, LegState::RollingIn ; "tracked leg as roll partner")]
    #[test_case(LegState::Closing, LegState::Locked ; "lock while closing")]
    #[test_case(LegState::Done, LegState::Loaded ; "reuse done")]
    fn rejected(from: LegState, to: LegState) {
        assert!(!LegStateMachine::is_valid_transition(from, to));
        let err = LegStateMachine::validate_transition(from, to).unwrap_err();
        assert!(matches!(err, ComboError::InvalidTransition { .. }));
    }

    #[test]
    fn next_states_match_table() {
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    LegStateMachine::valid_next_states(from).contains(&to),
                    LegStateMachine::is_valid_transition(from, to),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn done_is_terminal() {
        assert!(LegStateMachine::valid_next_states(LegState::Done).is_empty());
        assert!(!LegState::Done.is_live());
    }

    #[test]
    fn only_tracking_and_rolling_are_evaluated() {
        let evaluated: Vec<_> = ALL.into_iter().filter(LegState::is_evaluated).collect();
        assert_eq!(
            evaluated,
            vec![LegState::Tracking, LegState::RollingIn, LegState::RollingOut]
        );
    }
}
