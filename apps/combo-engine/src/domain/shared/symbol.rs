//! Symbol value object for instrument identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when validating a symbol.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// Symbol is empty.
    #[error("Symbol cannot be empty")]
    Empty,

    /// Symbol exceeds the provider length limit.
    #[error("Symbol exceeds maximum length: {0}")]
    TooLong(String),

    /// Symbol contains characters a provider will not accept.
    #[error("Symbol contains invalid characters: {0}")]
    InvalidCharacters(String),
}

/// A trading symbol (underlying ticker or provider option symbol).
///
/// Examples:
/// - Underlying: "SPY", "GLD"
/// - Option: "SPY250117P00450000" (OCC format)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Maximum length accepted by option providers.
    pub const MAX_LEN: usize = 21;

    /// Create a new Symbol.
    ///
    /// The symbol is trimmed and normalized to uppercase.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// Get the symbol string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the symbol carries no name at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if this is an option symbol (OCC format).
    ///
    /// OCC format: `{ROOT}{YY}{MM}{DD}{P/C}{PRICE}`
    /// - Root: 1-6 characters
    /// - Date: 6 digits (YYMMDD)
    /// - Type: P (put) or C (call)
    /// - Price: 8 digits (strike × 1000)
    #[must_use]
    pub fn is_option(&self) -> bool {
        let s = self.0.as_bytes();
        let len = s.len();
        if !(16..=Self::MAX_LEN).contains(&len) {
            return false;
        }

        let type_pos = len - 9;
        matches!(s[type_pos], b'P' | b'C')
            && s[len - 8..].iter().all(u8::is_ascii_digit)
            && s[type_pos - 6..type_pos].iter().all(u8::is_ascii_digit)
    }

    /// Extract the underlying root from an option symbol.
    ///
    /// Returns the full symbol if it's not an option.
    #[must_use]
    pub fn underlying(&self) -> Self {
        if self.is_option() {
            Self(self.0[..self.0.len() - 15].trim_end().to_string())
        } else {
            self.clone()
        }
    }

    /// Validate the symbol before handing it to a provider.
    ///
    /// # Errors
    ///
    /// Returns error if the symbol is empty, too long or contains invalid characters.
    pub fn validate(&self) -> Result<(), SymbolError> {
        if self.0.is_empty() {
            return Err(SymbolError::Empty);
        }

        if self.0.len() > Self::MAX_LEN {
            return Err(SymbolError::TooLong(self.0.clone()));
        }

        if !self.0.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
            return Err(SymbolError::InvalidCharacters(self.0.clone()));
        }

        Ok(())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
