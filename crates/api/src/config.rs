//! Application configuration
//!
//! Loaded from an optional `carewatch.toml` (path overridable through
//! `CAREWATCH_CONFIG`), then environment variables prefixed `CAREWATCH__`,
//! e.g. `CAREWATCH__SERVER__BIND_ADDR=0.0.0.0:9000`.

use crate::rate_limit::RateLimitConfig;
use alerting::AlertConfig;
use config::{Config, ConfigError, Environment, File};
use monitor::MonitorConfig;
use risk_scorer::RiskConfig;
use serde::{Deserialize, Serialize};
use thresholds::ThresholdTable;

/// Default config file, without extension
pub const DEFAULT_CONFIG_FILE: &str = "carewatch";

/// Server settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (default: `0.0.0.0:8080`)
    pub bind_addr: String,
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub log_level: String,
    /// `text` or `json`
    pub log_format: String,
    /// Where the repository snapshot is restored from and written to on
    /// shutdown; no persistence when unset
    pub snapshot_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            snapshot_path: None,
        }
    }
}

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub rate_limit: RateLimitConfig,
    pub lifecycle: AlertConfig,
    pub risk: RiskConfig,
    pub thresholds: ThresholdTable,
}

impl AppConfig {
    /// Load from the default file location and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CAREWATCH_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load from `path` (missing file allowed) and the environment
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let config: Self = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("CAREWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject engine settings the monitor cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        self.risk
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))
    }

    /// Engine settings
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            lifecycle: self.lifecycle.clone(),
            risk: self.risk.clone(),
            thresholds: self.thresholds.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_model::{MetricBands, MetricKind};
    use std::io::Write;

    fn write_config(name: &str, body: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("carewatch-{}-{}.toml", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", body).unwrap();
        path
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from("/nonexistent/carewatch-test").unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:8080");
        assert_eq!(config.lifecycle.resolve_after_normal, 3);
        assert_eq!(config.risk.window_days, 7);
    }

    #[test]
    fn test_file_overrides_sections() {
        let path = std::env::temp_dir().join(format!("carewatch-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[server]
log_format = "json"

[lifecycle]
resolve_after_normal = 5

[risk]
fall_penalty = 20.0

[thresholds.fall_impact.ceiling]
critical_above = 3.0
"#
        )
        .unwrap();

        let config = AppConfig::load_from(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.server.log_format, "json");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.lifecycle.resolve_after_normal, 5);
        assert_eq!(config.risk.fall_penalty, 20.0);
        assert_eq!(config.risk.min_readings, 3);
        assert_eq!(
            config.monitor_config().thresholds.get(MetricKind::FallImpact),
            &MetricBands::ceiling(3.0)
        );
    }

    #[test]
    fn test_rejects_inverted_default_bands() {
        let path = write_config(
            "inverted",
            r#"
[thresholds.heart_rate.range]
normal = { low = 100.0, high = 60.0 }
warning = { low = 50.0, high = 120.0 }
"#,
        );
        let result = AppConfig::load_from(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();

        match result {
            Err(ConfigError::Message(message)) => assert!(message.contains("heart_rate")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_oversized_risk_window() {
        let path = write_config("window", "[risk]\nwindow_days = 200000000\n");
        let result = AppConfig::load_from(path.to_str().unwrap());
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(ConfigError::Message(_))));
    }
}
