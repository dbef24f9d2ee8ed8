//! Leg note codec.
//!
//! A leg's role and lifecycle are written into its position's free-text note
//! so a restarted process can rebuild the combo from broker positions:
//!
//! ```text
//! type=synth_long,state=open,side=long,right=call,algo=collar
//! ```
//!
//! Keys are order independent. Unknown keys are ignored; `type` and `state`
//! are required.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::option_position::{OptionRight, PositionSide};

/// Errors decoding a leg note.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LegNoteError {
    /// Required key is absent.
    #[error("Leg note missing '{0}'")]
    MissingKey(&'static str),

    /// Key has a value outside its vocabulary.
    #[error("Leg note has invalid {key}: '{value}'")]
    InvalidValue {
        /// Key name.
        key: &'static str,
        /// Offending value.
        value: String,
    },

    /// Pair is not `key=value`.
    #[error("Malformed leg note pair: '{0}'")]
    Malformed(String),
}

macro_rules! note_vocabulary {
    ($(#[$meta:meta])* $name:ident, $key:literal { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Note spelling.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }

            fn parse(value: &str) -> Result<Self, LegNoteError> {
                match value {
                    $($text => Ok(Self::$variant),)+
                    other => Err(LegNoteError::InvalidValue {
                        key: $key,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

note_vocabulary!(
    /// Semantic slot a leg fills within its combo.
    LegRole, "type" {
        /// Long leg of a synthetic long.
        SynthLong => "synth_long",
        /// Short leg of a synthetic long.
        SynthShort => "synth_short",
        /// Short option sold against the synthetic.
        Cover => "cover",
        /// Long protective option.
        Protect => "protect",
        /// Long call.
        LongCall => "long_call",
        /// Long put.
        LongPut => "long_put",
        /// Short call.
        ShortCall => "short_call",
        /// Short put.
        ShortPut => "short_put",
        /// Near expiry leg of a spread.
        Front => "front",
        /// Far expiry leg of a spread.
        Back => "back",
    }
);

note_vocabulary!(
    /// Persisted lifecycle of a leg's position.
    NoteState, "state" {
        /// Position is open and managed.
        Open => "open",
        /// Managed manually until unlocked.
        Locked => "locked",
        /// Position was closed.
        Closed => "closed",
        /// Option expired.
        Expired => "expired",
        /// Slot reserved, no position yet.
        Vacant => "vacant",
    }
);

note_vocabulary!(
    /// Strategy that created a leg.
    ComboAlgo, "algo" {
        /// Collar.
        Collar => "collar",
        /// Strangle.
        Strangle => "strangle",
        /// Calendar spread.
        Calendar => "calendar",
        /// Diagonal spread.
        Diagonal => "diagonal",
    }
);

note_vocabulary!(
    /// Underlying trend direction when a leg was locked.
    LockDirection, "lock" {
        /// Locked on a rising underlying.
        Up => "up",
        /// Locked on a falling underlying.
        Down => "down",
    }
);

/// Decoded leg note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegNote {
    /// Role of the leg.
    pub role: LegRole,
    /// Lifecycle of the position.
    pub state: NoteState,
    /// Position side.
    pub side: Option<PositionSide>,
    /// Option right.
    pub right: Option<OptionRight>,
    /// Strategy.
    pub algo: Option<ComboAlgo>,
    /// Lock direction, when locked.
    pub lock: Option<LockDirection>,
}

impl LegNote {
    /// Note with just the required keys.
    #[must_use]
    pub const fn new(role: LegRole, state: NoteState) -> Self {
        Self {
            role,
            state,
            side: None,
            right: None,
            algo: None,
            lock: None,
        }
    }

    /// Set the side.
    #[must_use]
    pub const fn with_side(mut self, side: PositionSide) -> Self {
        self.side = Some(side);
        self
    }

    /// Set the right.
    #[must_use]
    pub const fn with_right(mut self, right: OptionRight) -> Self {
        self.right = Some(right);
        self
    }

    /// Set the strategy.
    #[must_use]
    pub const fn with_algo(mut self, algo: ComboAlgo) -> Self {
        self.algo = Some(algo);
        self
    }

    /// Copy with a new lifecycle state; the lock is dropped unless locked.
    #[must_use]
    pub const fn with_state(mut self, state: NoteState) -> Self {
        self.state = state;
        if !matches!(state, NoteState::Locked) {
            self.lock = None;
        }
        self
    }

    /// Mark as locked in `direction`.
    #[must_use]
    pub const fn locked(mut self, direction: LockDirection) -> Self {
        self.state = NoteState::Locked;
        self.lock = Some(direction);
        self
    }
}

impl fmt::Display for LegNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type={},state={}", self.role, self.state)?;
        if let Some(side) = self.side {
            let side = match side {
                PositionSide::Long => "long",
                PositionSide::Short => "short",
            };
            write!(f, ",side={side}")?;
        }
        if let Some(right) = self.right {
            let right = match right {
                OptionRight::Call => "call",
                OptionRight::Put => "put",
            };
            write!(f, ",right={right}")?;
        }
        if let Some(algo) = self.algo {
            write!(f, ",algo={algo}")?;
        }
        if let Some(lock) = self.lock {
            write!(f, ",lock={lock}")?;
        }
        Ok(())
    }
}

impl FromStr for LegNote {
    type Err = LegNoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut role = None;
        let mut state = None;
        let mut note = Self::new(LegRole::SynthLong, NoteState::Vacant);

        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| LegNoteError::Malformed(pair.to_string()))?;
            let value = value.trim();
            match key.trim() {
                "type" => role = Some(LegRole::parse(value)?),
                "state" => state = Some(NoteState::parse(value)?),
                "side" => {
                    note.side = Some(match value {
                        "long" => PositionSide::Long,
                        "short" => PositionSide::Short,
                        other => {
                            return Err(LegNoteError::InvalidValue {
                                key: "side",
                                value: other.to_string(),
                            });
                        }
                    });
                }
                "right" => {
                    note.right = Some(match value {
                        "call" => OptionRight::Call,
                        "put" => OptionRight::Put,
                        other => {
                            return Err(LegNoteError::InvalidValue {
                                key: "right",
                                value: other.to_string(),
                            });
                        }
                    });
                }
                "algo" => note.algo = Some(ComboAlgo::parse(value)?),
                "lock" => note.lock = Some(LockDirection::parse(value)?),
                _ => {}
            }
        }

        note.role = role.ok_or(LegNoteError::MissingKey("type"))?;
        note.state = state.ok_or(LegNoteError::MissingKey("state"))?;
        Ok(note)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_note_round_trips() {
        let note = LegNote::new(LegRole::Cover, NoteState::Open)
            .with_side(PositionSide::Short)
            .with_right(OptionRight::Call)
            .with_algo(ComboAlgo::Collar)
            .locked(LockDirection::Up);

        let text = note.to_string();
        assert_eq!(
            text,
            "type=cover,state=locked,side=short,right=call,algo=collar,lock=up"
        );
        assert_eq!(text.parse::<LegNote>().unwrap(), note);
    }

    #[test]
    fn keys_are_order_independent_and_unknown_keys_ignored() {
        let note: LegNote = " state=open , colour=blue, type=back ".parse().unwrap();
        assert_eq!(note, LegNote::new(LegRole::Back, NoteState::Open));
    }

    #[test]
    fn missing_required_keys() {
        assert_eq!(
            "state=open".parse::<LegNote>().unwrap_err(),
            LegNoteError::MissingKey("type")
        );
        assert_eq!(
            "type=front".parse::<LegNote>().unwrap_err(),
            LegNoteError::MissingKey("state")
        );
        assert_eq!(
            "".parse::<LegNote>().unwrap_err(),
            LegNoteError::MissingKey("type")
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = "type=hedge,state=open".parse::<LegNote>().unwrap_err();
        assert!(matches!(err, LegNoteError::InvalidValue { key: "type", .. }));

        let err = "type=front,state=open,side=flat".parse::<LegNote>().unwrap_err();
        assert!(matches!(err, LegNoteError::InvalidValue { key: "side", .. }));
    }

    #[test]
    fn bare_word_is_malformed() {
        let err = "type=front,open".parse::<LegNote>().unwrap_err();
        assert_eq!(err, LegNoteError::Malformed("open".to_string()));
    }

    #[test]
    fn leaving_locked_clears_direction() {
        let note = LegNote::new(LegRole::Front, NoteState::Open)
            .locked(LockDirection::Down)
            .with_state(NoteState::Open);
        assert_eq!(note.lock, None);
    }
}
