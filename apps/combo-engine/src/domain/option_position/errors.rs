//! Option Position Errors

use thiserror::Error;

/// Errors that can occur with option contracts and positions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionPositionError {
    /// Invalid option contract.
    #[error("Invalid option contract: {message}")]
    InvalidContract { message: String },

    /// Provider symbol could not be decoded.
    #[error("Invalid option symbol '{symbol}': {message}")]
    InvalidSymbol { symbol: String, message: String },

    /// Fill does not belong to the position's contract.
    #[error("Fill for {symbol} applied to position on {position_symbol}")]
    ContractMismatch {
        symbol: String,
        position_symbol: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = OptionPositionError::InvalidContract {
            message: "non-positive strike".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid option contract: non-positive strike");

        let err = OptionPositionError::InvalidSymbol {
            symbol: "SPY".to_string(),
            message: "not an OCC symbol".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid option symbol 'SPY': not an OCC symbol"
        );
    }
}
