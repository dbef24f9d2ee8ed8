//! Portfolio Value Object
//!
//! The portfolio is owned by the broader trading system. A combo only holds a
//! shared reference so that every leg position rolls up to the same id.

use serde::{Deserialize, Serialize};

use crate::domain::shared::{PortfolioId, Symbol};

/// A portfolio that combo leg positions roll up to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    id: PortfolioId,
    underlying: Symbol,
    description: String,
}

impl Portfolio {
    /// Create a portfolio description.
    #[must_use]
    pub fn new(id: PortfolioId, underlying: Symbol, description: impl Into<String>) -> Self {
        Self {
            id,
            underlying,
            description: description.into(),
        }
    }

    /// Portfolio identifier.
    #[must_use]
    pub const fn id(&self) -> &PortfolioId {
        &self.id
    }

    /// Underlying the portfolio trades.
    #[must_use]
    pub const fn underlying(&self) -> &Symbol {
        &self.underlying
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}
