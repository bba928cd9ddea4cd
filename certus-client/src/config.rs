//! Configuration loading for CERTUS clients.
//!
//! `[telemetry]` and `[notifications]` are required. `[sync]` may be omitted,
//! in which case every read races a query against an update.

use certus_core::SyncConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV_VAR: &str = "CERTUS_CONFIG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    pub telemetry: TelemetryConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is not set.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationConfig {
    /// Toasts kept before the oldest is dropped.
    pub max_retained: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or CERTUS_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("Invalid sync config: {0}")]
    Sync(#[from] certus_core::ConfigError),
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telemetry.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "telemetry.filter",
                reason: "must not be empty".to_string(),
            });
        }
        if self.notifications.max_retained == 0 {
            return Err(ConfigError::InvalidValue {
                field: "notifications.max_retained",
                reason: "must be > 0".to_string(),
            });
        }
        self.sync.validate()?;
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use certus_core::ReadStrategy;

    const MINIMAL: &str = r#"
[telemetry]
filter = "certus_sync=debug,info"
json = false

[notifications]
max_retained = 5
"#;

    #[test]
    fn test_sync_section_defaults() {
        let config = ClientConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.sync, SyncConfig::default());
        assert_eq!(config.notifications.max_retained, 5);
    }

    #[test]
    fn test_force_strategy_parses() {
        let toml = format!("{MINIMAL}\n[sync]\nforce_strategy = \"update\"\n");
        let config = ClientConfig::from_toml(&toml).unwrap();
        assert_eq!(config.sync.force_strategy, Some(ReadStrategy::Update));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = format!("{MINIMAL}\n[sync]\nretry = 3\n");
        assert!(matches!(
            ClientConfig::from_toml(&toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_zero_retention_rejected() {
        let toml = MINIMAL.replace("max_retained = 5", "max_retained = 0");
        assert!(matches!(
            ClientConfig::from_toml(&toml),
            Err(ConfigError::InvalidValue {
                field: "notifications.max_retained",
                ..
            })
        ));
    }

    #[test]
    fn test_sync_validation_is_applied() {
        let toml = format!(
            "{MINIMAL}\n[sync]\nforce_strategy = \"update\"\nsoft_notice_on_uncertified_error = true\n"
        );
        assert!(matches!(
            ClientConfig::from_toml(&toml),
            Err(ConfigError::Sync(_))
        ));
    }
}
