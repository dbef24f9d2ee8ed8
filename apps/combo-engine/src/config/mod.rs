//! Configuration module for the combo engine.
//!
//! Loads YAML with environment variable interpolation and validates the
//! combo thresholds before anything is built from them.
//!
//! # Usage
//!
//! ```rust,ignore
//! use combo_engine::config::load_config;
//!
//! let config = load_config(None)?;
//! println!("roll at {} DTE", config.combo.roll_dte);
//! ```

mod chains;
mod combo;
mod observability;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use chains::ChainConfig;
pub use combo::ComboConfig;
pub use observability::{LogFormat, LoggingConfig, ObservabilityConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Combo thresholds.
    #[serde(default)]
    pub combo: ComboConfig,
    /// Chain aggregation settings.
    #[serde(default)]
    pub chains: ChainConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string.
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = serde_yaml_bw::from_str(&interpolated)?;
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map_or("", |m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.to_string(),
        }
    })
    .into_owned()
}

fn require_fraction(name: &str, value: Decimal) -> Result<(), ConfigError> {
    if value <= Decimal::ZERO || value > Decimal::ONE {
        return Err(ConfigError::ValidationError(format!(
            "{name} must be in (0, 1], got {value}"
        )));
    }
    Ok(())
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let combo = &config.combo;

    require_fraction("combo.max_strike_delta", combo.max_strike_delta)?;
    require_fraction("combo.max_strangle_delta", combo.max_strangle_delta)?;
    require_fraction("combo.take_profit_fraction", combo.take_profit_fraction)?;
    require_fraction("combo.far_itm_fraction", combo.far_itm_fraction)?;

    if combo.roll_dte < 0 {
        return Err(ConfigError::ValidationError(
            "combo.roll_dte must not be negative".to_string(),
        ));
    }

    if combo.lock_slope <= Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "combo.lock_slope must be positive".to_string(),
        ));
    }

    if combo.combo_profit_target <= Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "combo.combo_profit_target must be positive".to_string(),
        ));
    }

    if combo.default_quantity <= Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "combo.default_quantity must be positive".to_string(),
        ));
    }

    if combo.spread.days_front < 0 || combo.spread.days_back <= combo.spread.days_front {
        return Err(ConfigError::ValidationError(
            "combo.spread requires 0 <= days_front < days_back".to_string(),
        ));
    }

    if config.chains.underlying.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "chains.underlying must not be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.combo.max_strike_delta, dec!(0.21));
        assert_eq!(config.combo.roll_dte, 1);
        assert_eq!(config.chains.underlying, "SPY");
        assert_eq!(config.observability.logging.format, LogFormat::Compact);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_minimal_config() {
        let yaml = r"
combo:
  roll_dte: 3
chains:
  underlying: GLD
";

        let config = match load_config_from_string(yaml) {
            Ok(c) => c,
            Err(e) => panic!("should load minimal config: {e}"),
        };
        assert_eq!(config.combo.roll_dte, 3);
        assert_eq!(config.chains.underlying, "GLD");
        assert_eq!(config.combo.lock_slope, dec!(0.75));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "observability:\n  logging:\n    format: pretty").unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.observability.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_config(Some("/nonexistent/combo.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        let input = "underlying: ${COMBO_CONFIG_TEST_NONEXISTENT_VAR:-GLD}";
        let result = interpolate_env_vars(input);

        assert_eq!(result, "underlying: GLD");
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let input = "underlying: ${COMBO_CONFIG_TEST_UNLIKELY_TO_EXIST}";
        let result = interpolate_env_vars(input);

        assert_eq!(result, "underlying: ");
    }

    #[test]
    fn test_validation_rejects_delta_above_one() {
        let yaml = r"
combo:
  max_strike_delta: 1.5
";

        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for max_strike_delta");
        };
        assert!(err.to_string().contains("max_strike_delta"));
    }

    #[test]
    fn test_validation_rejects_negative_roll_dte() {
        let yaml = r"
combo:
  roll_dte: -1
";

        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for roll_dte");
        };
        assert!(err.to_string().contains("roll_dte"));
    }

    #[test]
    fn test_strategy_and_spread() {
        let yaml = r"
combo:
  strategy: calendar
  spread:
    days_front: 3
    days_back: 45
";

        let config = load_config_from_string(yaml).unwrap();
        assert_eq!(config.combo.strategy, crate::combo::ComboAlgo::Calendar);
        assert_eq!(config.combo.spread.days_back, 45);
    }

    #[test]
    fn test_validation_rejects_inverted_spread() {
        let yaml = r"
combo:
  spread:
    days_front: 30
    days_back: 7
";

        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for spread");
        };
        assert!(err.to_string().contains("combo.spread"));
    }
}
