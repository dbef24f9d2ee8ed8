//! Contract discovery port.
//!
//! Discovery is a driven port: a provider enumerates every listed option
//! contract of an underlying and pushes each one into a sink. Ordering is
//! arbitrary and duplicates are allowed.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::domain::option_position::OptionContract;
use crate::domain::shared::Symbol;

/// Receiver for discovered contracts.
pub type ContractSink<'a> = dyn FnMut(OptionContract) + Send + 'a;

/// Errors from a discovery provider.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Snapshot could not be read.
    #[error("Failed to read contract snapshot {path}: {source}")]
    Io {
        /// Snapshot path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Snapshot is not valid JSON or holds a bad record.
    #[error("Failed to parse contract snapshot: {message}")]
    Parse {
        /// Error details.
        message: String,
    },

    /// Provider-side failure.
    #[error("Provider error: {message}")]
    Provider {
        /// Error details.
        message: String,
    },
}

/// Port for enumerating the option contracts of an underlying.
#[async_trait]
pub trait ContractDiscovery: Send + Sync {
    /// Push every contract listed for `underlying` into `sink`.
    ///
    /// Returns the number of contracts delivered, duplicates included.
    async fn discover(
        &self,
        underlying: &Symbol,
        sink: &mut ContractSink<'_>,
    ) -> Result<usize, DiscoveryError>;
}

/// In-memory discovery over a fixed contract list.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    contracts: Vec<OptionContract>,
}

impl StaticDiscovery {
    /// Create a provider over `contracts`.
    #[must_use]
    pub const fn new(contracts: Vec<OptionContract>) -> Self {
        Self { contracts }
    }
}

#[async_trait]
impl ContractDiscovery for StaticDiscovery {
    async fn discover(
        &self,
        underlying: &Symbol,
        sink: &mut ContractSink<'_>,
    ) -> Result<usize, DiscoveryError> {
        let mut delivered = 0;
        for contract in self
            .contracts
            .iter()
            .filter(|c| c.underlying() == underlying)
        {
            sink(contract.clone());
            delivered += 1;
        }
        Ok(delivered)
    }
}

/// One snapshot record: a full contract or a bare OCC symbol.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContractRecord {
    Full(OptionContract),
    Occ { symbol: Symbol },
}

impl ContractRecord {
    fn into_contract(self) -> Result<OptionContract, DiscoveryError> {
        match self {
            Self::Full(contract) => Ok(contract),
            Self::Occ { symbol } => {
                OptionContract::from_occ(&symbol).map_err(|e| DiscoveryError::Parse {
                    message: e.to_string(),
                })
            }
        }
    }
}

/// Discovery backed by a JSON array snapshot on disk.
#[derive(Debug, Clone)]
pub struct JsonFileDiscovery {
    path: PathBuf,
}

impl JsonFileDiscovery {
    /// Create a provider reading `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Snapshot path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ContractDiscovery for JsonFileDiscovery {
    async fn discover(
        &self,
        underlying: &Symbol,
        sink: &mut ContractSink<'_>,
    ) -> Result<usize, DiscoveryError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| DiscoveryError::Io {
                path: self.path.clone(),
                source,
            })?;
        let records: Vec<ContractRecord> =
            serde_json::from_str(&raw).map_err(|e| DiscoveryError::Parse {
                message: e.to_string(),
            })?;

        let mut delivered = 0;
        for record in records {
            let contract = record.into_contract()?;
            if contract.underlying() != underlying {
                debug!(symbol = %contract.symbol(), "Skipping contract for other underlying");
                continue;
            }
            sink(contract);
            delivered += 1;
        }
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::option_position::OptionRight;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::io::Write;

    fn expiry() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 17).unwrap()
    }

    #[tokio::test]
    async fn static_discovery_filters_by_underlying() {
        let provider = StaticDiscovery::new(vec![
            OptionContract::occ("SPY", dec!(450), expiry(), OptionRight::Call),
            OptionContract::occ("QQQ", dec!(400), expiry(), OptionRight::Call),
            OptionContract::occ("SPY", dec!(450), expiry(), OptionRight::Put),
        ]);
        let mut seen = Vec::new();
        let delivered = provider
            .discover(&Symbol::new("SPY"), &mut |c: OptionContract| seen.push(c))
            .await
            .unwrap();

        assert_eq!(delivered, 2);
        assert!(seen.iter().all(|c| c.underlying().as_str() == "SPY"));
    }

    #[tokio::test]
    async fn json_snapshot_accepts_occ_and_full_records() {
        let full = OptionContract::occ("SPY", dec!(455), expiry(), OptionRight::Put);
        let json = format!(
            r#"[{{"symbol": "SPY250117C00450000"}}, {}]"#,
            serde_json::to_string(&full).unwrap()
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let provider = JsonFileDiscovery::new(file.path());
        let mut seen = Vec::new();
        let delivered = provider
            .discover(&Symbol::new("SPY"), &mut |c: OptionContract| seen.push(c))
            .await
            .unwrap();

        assert_eq!(delivered, 2);
        assert_eq!(seen[0].strike(), dec!(450));
        assert_eq!(seen[0].right(), OptionRight::Call);
        assert_eq!(seen[1], full);
    }

    #[tokio::test]
    async fn json_snapshot_missing_file_is_io_error() {
        let provider = JsonFileDiscovery::new("/nonexistent/contracts.json");
        let err = provider
            .discover(&Symbol::new("SPY"), &mut |_: OptionContract| {})
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Io { .. }));
    }

    #[tokio::test]
    async fn json_snapshot_bad_occ_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"[{"symbol": "SPY"}]"#).unwrap();

        let err = JsonFileDiscovery::new(file.path())
            .discover(&Symbol::new("SPY"), &mut |_: OptionContract| {})
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Parse { .. }));
    }
}
