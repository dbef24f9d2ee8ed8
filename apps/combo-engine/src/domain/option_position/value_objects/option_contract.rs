//! Option Contract Value Object

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::domain::option_position::OptionPositionError;
use crate::domain::shared::Symbol;

/// Option right (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionRight {
    /// Call option (right to buy).
    Call,
    /// Put option (right to sell).
    Put,
}

impl OptionRight {
    /// OCC side character.
    #[must_use]
    pub const fn occ_char(&self) -> char {
        match self {
            Self::Call => 'C',
            Self::Put => 'P',
        }
    }
}

impl std::fmt::Display for OptionRight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "CALL"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

const fn default_multiplier() -> u32 {
    100
}

/// Option contract specification.
///
/// `symbol` is the provider-specific name used to request the contract; the
/// chain aggregator indexes on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptionContract {
    /// Provider symbol (e.g., "SPY250117C00450000").
    symbol: Symbol,
    /// Underlying symbol.
    underlying: Symbol,
    /// Strike price.
    strike: Decimal,
    /// Expiration date.
    expiration: NaiveDate,
    /// Call or put.
    right: OptionRight,
    /// Contract multiplier (typically 100 for equity options).
    #[serde(default = "default_multiplier")]
    multiplier: u32,
}

impl OptionContract {
    /// Create a new option contract.
    #[must_use]
    pub fn new(
        symbol: Symbol,
        underlying: impl Into<Symbol>,
        strike: Decimal,
        expiration: NaiveDate,
        right: OptionRight,
    ) -> Self {
        Self {
            symbol,
            underlying: underlying.into(),
            strike,
            expiration,
            right,
            multiplier: default_multiplier(),
        }
    }

    /// Create a contract whose provider symbol is the OCC name.
    #[must_use]
    pub fn occ(
        underlying: impl Into<Symbol>,
        strike: Decimal,
        expiration: NaiveDate,
        right: OptionRight,
    ) -> Self {
        let underlying = underlying.into();
        let symbol = Self::occ_symbol(&underlying, strike, expiration, right);
        Self::new(symbol, underlying, strike, expiration, right)
    }

    /// Build the OCC symbol for a contract.
    #[must_use]
    pub fn occ_symbol(
        underlying: &Symbol,
        strike: Decimal,
        expiration: NaiveDate,
        right: OptionRight,
    ) -> Symbol {
        let milli = (strike * Decimal::ONE_THOUSAND)
            .trunc()
            .to_i64()
            .unwrap_or_default();
        Symbol::new(format!(
            "{}{}{}{:08}",
            underlying.as_str(),
            expiration.format("%y%m%d"),
            right.occ_char(),
            milli
        ))
    }

    /// Decode a contract from an OCC provider symbol.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSymbol` if the symbol is not in OCC format or encodes an
    /// impossible date.
    pub fn from_occ(symbol: &Symbol) -> Result<Self, OptionPositionError> {
        let invalid = |message: &str| OptionPositionError::InvalidSymbol {
            symbol: symbol.to_string(),
            message: message.to_string(),
        };

        if !symbol.is_option() {
            return Err(invalid("not an OCC symbol"));
        }

        let s = symbol.as_str();
        let len = s.len();
        let right = match &s[len - 9..len - 8] {
            "C" => OptionRight::Call,
            _ => OptionRight::Put,
        };
        let expiration = NaiveDate::parse_from_str(&s[len - 15..len - 9], "%y%m%d")
            .map_err(|_| invalid("bad expiration date"))?;
        let milli: i64 = s[len - 8..]
            .parse()
            .map_err(|_| invalid("bad strike digits"))?;

        Ok(Self::new(
            symbol.clone(),
            symbol.underlying(),
            Decimal::new(milli, 3).normalize(),
            expiration,
            right,
        ))
    }

    /// Set a custom multiplier.
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: u32) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Get the provider symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Get the underlying symbol.
    #[must_use]
    pub const fn underlying(&self) -> &Symbol {
        &self.underlying
    }

    /// Get the strike price.
    #[must_use]
    pub const fn strike(&self) -> Decimal {
        self.strike
    }

    /// Get the expiration date.
    #[must_use]
    pub const fn expiration(&self) -> NaiveDate {
        self.expiration
    }

    /// Get the option right.
    #[must_use]
    pub const fn right(&self) -> OptionRight {
        self.right
    }

    /// Get the contract multiplier.
    #[must_use]
    pub const fn multiplier(&self) -> u32 {
        self.multiplier
    }

    /// Check if this is a call option.
    #[must_use]
    pub const fn is_call(&self) -> bool {
        matches!(self.right, OptionRight::Call)
    }

    /// Check if this is a put option.
    #[must_use]
    pub const fn is_put(&self) -> bool {
        matches!(self.right, OptionRight::Put)
    }

    /// Signed distance into the money (positive ITM, negative OTM).
    #[must_use]
    pub fn itm_amount(&self, underlying_price: Decimal) -> Decimal {
        match self.right {
            OptionRight::Call => underlying_price - self.strike,
            OptionRight::Put => self.strike - underlying_price,
        }
    }

    /// Check if the option is in the money at the given underlying price.
    #[must_use]
    pub fn is_itm(&self, underlying_price: Decimal) -> bool {
        self.itm_amount(underlying_price) > Decimal::ZERO
    }

    /// Intrinsic value per share at the given underlying price.
    #[must_use]
    pub fn intrinsic(&self, underlying_price: Decimal) -> Decimal {
        self.itm_amount(underlying_price).max(Decimal::ZERO)
    }

    /// Calendar days until expiration (negative once expired).
    #[must_use]
    pub fn days_to_expiry(&self, as_of: NaiveDate) -> i64 {
        (self.expiration - as_of).num_days()
    }

    /// Check if the option has expired.
    #[must_use]
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        self.expiration < as_of
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 17).unwrap()
    }

    #[test]
    fn option_right_display_and_serde() {
        assert_eq!(OptionRight::Call.to_string(), "CALL");
        assert_eq!(serde_json::to_string(&OptionRight::Put).unwrap(), "\"PUT\"");
    }

    #[test]
    fn occ_symbol_formats_strike_in_thousandths() {
        let symbol = OptionContract::occ_symbol(
            &Symbol::new("SPY"),
            dec!(450.5),
            expiry(),
            OptionRight::Call,
        );
        assert_eq!(symbol.as_str(), "SPY250117C00450500");
    }

    #[test]
    fn from_occ_decodes_fields() {
        let contract = OptionContract::from_occ(&Symbol::new("GLD250117P00180500")).unwrap();
        assert_eq!(contract.underlying().as_str(), "GLD");
        assert_eq!(contract.strike(), dec!(180.5));
        assert_eq!(contract.expiration(), expiry());
        assert!(contract.is_put());
        assert_eq!(contract.multiplier(), 100);
    }

    #[test]
    fn from_occ_rejects_non_option() {
        assert!(matches!(
            OptionContract::from_occ(&Symbol::new("GLD")),
            Err(OptionPositionError::InvalidSymbol { .. })
        ));
        assert!(OptionContract::from_occ(&Symbol::new("GLD251399P00180500")).is_err());
    }

    #[test]
    fn moneyness() {
        let call = OptionContract::occ("SPY", dec!(450), expiry(), OptionRight::Call);
        let put = OptionContract::occ("SPY", dec!(450), expiry(), OptionRight::Put);

        assert!(call.is_itm(dec!(455)));
        assert!(!put.is_itm(dec!(455)));
        assert_eq!(call.intrinsic(dec!(455)), dec!(5));
        assert_eq!(put.intrinsic(dec!(455)), Decimal::ZERO);
        assert_eq!(put.itm_amount(dec!(440)), dec!(10));
    }

    #[test]
    fn expiry_arithmetic() {
        let call = OptionContract::occ("SPY", dec!(450), expiry(), OptionRight::Call);
        let before = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let after = NaiveDate::from_ymd_opt(2025, 1, 18).unwrap();

        assert_eq!(call.days_to_expiry(before), 7);
        assert!(!call.is_expired(expiry()));
        assert!(call.is_expired(after));
    }

    #[test]
    fn contract_deserializes_with_default_multiplier() {
        let json = r#"{
            "symbol": "SPY250117C00450000",
            "underlying": "SPY",
            "strike": "450",
            "expiration": "2025-01-17",
            "right": "CALL"
        }"#;
        let contract: OptionContract = serde_json::from_str(json).unwrap();
        assert_eq!(contract.multiplier(), 100);
        assert_eq!(contract.strike(), dec!(450));
    }
}
