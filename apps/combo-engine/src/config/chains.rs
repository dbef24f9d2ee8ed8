//! Chain aggregation configuration.

use serde::{Deserialize, Serialize};

/// Chain aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Underlying symbol whose contracts are aggregated.
    #[serde(default = "default_underlying")]
    pub underlying: String,
    /// Retained chains with fewer strikes are reported as thin.
    #[serde(default = "default_min_strikes")]
    pub min_strikes_per_chain: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            underlying: default_underlying(),
            min_strikes_per_chain: default_min_strikes(),
        }
    }
}

fn default_underlying() -> String {
    "SPY".to_string()
}

const fn default_min_strikes() -> usize {
    1
}
