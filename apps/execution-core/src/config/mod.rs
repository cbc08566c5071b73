//! Configuration module for the execution core.
//!
//! Loads YAML configuration with environment variable interpolation and
//! validates it before any component is built from it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use execution_core::config::{Config, load_config};
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! // Load from custom path
//! let config = load_config(Some("custom/config.yaml"))?;
//!
//! let rules = config.stops.to_stop_rules()?;
//! ```

mod exit;
mod lots;
mod matching;
mod observability;
mod stops;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use exit::ExitSettings;
pub use lots::LotsConfig;
pub use matching::MatchingConfig;
pub use observability::{LoggingConfig, MetricsSettings, ObservabilityConfig};
pub use stops::StopsConfig;

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

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Report matcher configuration.
    #[serde(default)]
    pub matching: MatchingConfig,
    /// Lot tracker and manager configuration.
    #[serde(default)]
    pub lots: LotsConfig,
    /// Per-lot stop rules.
    #[serde(default)]
    pub stops: StopsConfig,
    /// Exit executor configuration.
    #[serde(default)]
    pub exit: ExitSettings,
    /// Logging and metrics configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

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

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let config: Config = if interpolated.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml_bw::from_str(&interpolated)?
    };
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is a constant; it always compiles
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let matching = &config.matching;
    let valid_modes = ["time_order", "price_tolerance"];
    if !valid_modes.contains(&matching.mode.to_lowercase().as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "matching.mode must be one of: {valid_modes:?}"
        )));
    }

    if matching.price_tolerance < Decimal::ZERO {
        return Err(ConfigError::ValidationError(
            "matching.price_tolerance must be >= 0".to_string(),
        ));
    }

    if matching.window_secs == 0 {
        return Err(ConfigError::ValidationError(
            "matching.window_secs must be positive".to_string(),
        ));
    }

    if config.lots.routing_window_secs == 0 {
        return Err(ConfigError::ValidationError(
            "lots.routing_window_secs must be positive".to_string(),
        ));
    }

    config
        .stops
        .to_stop_rules()
        .map_err(|e| ConfigError::ValidationError(format!("stops: {e}")))?;

    if config.exit.pending_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "exit.pending_timeout_secs must be positive".to_string(),
        ));
    }

    let valid_formats = ["json", "pretty", "compact"];
    let format = config.observability.logging.format.to_lowercase();
    if !valid_formats.contains(&format.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "observability.logging.format must be one of: {valid_formats:?}"
        )));
    }

    if config.observability.metrics.enabled {
        config.observability.metrics.to_metrics_config()?;
    }

    Ok(())
}

pub(crate) const fn default_true() -> bool {
    true
}

pub(crate) fn seconds(secs: u64) -> chrono::Duration {
    chrono::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exit_execution::ExitConfirmation;
    use crate::domain::order_matching::MatchMode;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_document_is_default() {
        let config = load_config_from_string("").unwrap();
        assert_eq!(config.matching.window_secs, 30);
        assert_eq!(config.lots.max_retries, 5);
        assert_eq!(config.stops.lot_rules.len(), 3);
        assert_eq!(config.exit.confirmation, ExitConfirmation::OnAck);
        assert!(!config.observability.metrics.enabled);
    }

    #[test]
    fn test_load_partial_config() {
        let yaml = r"
matching:
  mode: price_tolerance
  price_tolerance: 1.5
lots:
  max_retries: 2
";
        let config = load_config_from_string(yaml).unwrap();
        assert_eq!(
            config.matching.to_matcher_config().mode,
            MatchMode::PriceTolerance {
                tolerance: dec!(1.5),
                fallback_to_time_order: true,
            }
        );
        assert_eq!(config.lots.max_retries, 2);
        assert_eq!(config.lots.retry_cooldown_ms, 1_000);
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        let input = "mode: ${EXECUTION_CORE_TEST_NONEXISTENT_VAR:-time_order}";
        assert_eq!(interpolate_env_vars(input), "mode: time_order");
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let input = "journal_path: ${EXECUTION_CORE_TEST_UNLIKELY_TO_EXIST}";
        assert_eq!(interpolate_env_vars(input), "journal_path: ");
    }

    #[test]
    #[expect(clippy::literal_string_with_formatting_args)] // ${...} is env var syntax
    fn test_env_var_with_default_uses_existing() {
        let result = interpolate_env_vars("path: ${PATH:-default}");
        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn test_validation_invalid_mode() {
        let Err(err) = load_config_from_string("matching:\n  mode: fastest\n") else {
            panic!("expected error for invalid mode");
        };
        assert!(err.to_string().contains("matching.mode"));
    }

    #[test]
    fn test_validation_negative_tolerance() {
        let yaml = "matching:\n  mode: price_tolerance\n  price_tolerance: -1\n";
        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for negative tolerance");
        };
        assert!(err.to_string().contains("price_tolerance"));
    }

    #[test]
    fn test_validation_zero_window() {
        let Err(err) = load_config_from_string("matching:\n  window_secs: 0\n") else {
            panic!("expected error for zero window");
        };
        assert!(err.to_string().contains("window_secs"));
    }

    #[test]
    fn test_validation_pullback_ratio_out_of_range() {
        let yaml = r"
stops:
  lot_rules:
    - activation_points: 15
      pullback_ratio: 1.5
";
        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for pullback ratio");
        };
        assert!(err.to_string().contains("pullback_ratio"));
    }

    #[test]
    fn test_validation_bad_metrics_addr() {
        let yaml = r"
observability:
  metrics:
    enabled: true
    listen_addr: not-an-address
";
        let Err(err) = load_config_from_string(yaml) else {
            panic!("expected error for listen addr");
        };
        assert!(err.to_string().contains("listen_addr"));
    }

    #[test]
    fn test_load_missing_file() {
        let Err(err) = load_config(Some("/nonexistent/execution-core.yaml")) else {
            panic!("expected read error");
        };
        assert!(matches!(err, ConfigError::ReadError { .. }));
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
matching:
  mode: time_order
  window_secs: 45
  product_aliases:
    MTX: MXF
lots:
  max_retries: 3
  retry_cooldown_ms: 500
  routing_window_secs: 20
  cleanup_age_secs: 600
stops:
  lot_rules:
    - { activation_points: 10, pullback_ratio: 0.25 }
    - { activation_points: 30, pullback_ratio: 0.25, protective_multiplier: 1.5 }
exit:
  confirmation: on_fill
  pending_timeout_secs: 10
  journal_path: "/var/lib/execution-core/unpersisted.jsonl"
observability:
  logging:
    level: debug
    format: pretty
    include_spans: false
"#;
        let config = load_config_from_string(yaml).unwrap();
        assert_eq!(config.matching.window_secs, 45);
        assert_eq!(config.matching.product_aliases.len(), 1);
        assert_eq!(config.lots.cleanup_age_secs, 600);
        let rules = config.stops.to_stop_rules().unwrap();
        assert_eq!(rules.rule_for(5).protective_multiplier, Some(dec!(1.5)));
        assert_eq!(config.exit.confirmation, ExitConfirmation::OnFill);
        assert_eq!(
            config.exit.journal_path.as_deref(),
            Some("/var/lib/execution-core/unpersisted.jsonl")
        );
        assert_eq!(config.observability.logging.level, "debug");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "lots:\n  max_retries: 1\n").unwrap();
        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.lots.max_retries, 1);
    }
}
