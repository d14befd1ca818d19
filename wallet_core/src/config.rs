//! Wallet configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::logging::LogFormat;
use crate::vault::MAX_ITERATIONS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(String),

    #[error("cannot parse config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for a wallet host.
///
/// Can be loaded from a TOML file via [`WalletConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Node URL written into a freshly created wallet's settings.
    #[serde(default = "default_node_url")]
    pub default_node_url: String,

    /// How long a session unlock stays valid, in seconds.
    #[serde(default = "default_unlock_ttl_secs")]
    pub unlock_ttl_secs: u64,

    /// PBKDF2 iterations for newly created vaults. Existing vaults keep the
    /// count stored in their envelope.
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Upper bound for every node request, in seconds.
    #[serde(default = "default_node_timeout_secs")]
    pub node_timeout_secs: u64,

    /// Persistent-storage key of the sealed vault.
    #[serde(default = "default_vault_storage_key")]
    pub vault_storage_key: String,

    /// Session-storage key of the cached unlock entry.
    #[serde(default = "default_session_storage_key")]
    pub session_storage_key: String,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_node_url() -> String {
    "http://localhost:7332".to_string()
}

fn default_unlock_ttl_secs() -> u64 {
    15 * 60
}

fn default_kdf_iterations() -> u32 {
    modulr_crypto::DEFAULT_PBKDF2_ITERATIONS
}

fn default_node_timeout_secs() -> u64 {
    30
}

fn default_vault_storage_key() -> String {
    "modulr.vault.v1".to_string()
}

fn default_session_storage_key() -> String {
    "modulr.session.unlock.v1".to_string()
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl WalletConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string and validate it.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kdf_iterations == 0 {
            return Err(ConfigError::Invalid("kdf_iterations must be positive".into()));
        }
        if self.kdf_iterations > MAX_ITERATIONS {
            return Err(ConfigError::Invalid(format!(
                "kdf_iterations must not exceed {MAX_ITERATIONS}"
            )));
        }
        if self.unlock_ttl_secs == 0 {
            return Err(ConfigError::Invalid("unlock_ttl_secs must be positive".into()));
        }
        if self.node_timeout_secs == 0 {
            return Err(ConfigError::Invalid("node_timeout_secs must be positive".into()));
        }
        if self.vault_storage_key.is_empty() || self.session_storage_key.is_empty() {
            return Err(ConfigError::Invalid("storage keys must not be empty".into()));
        }
        modulr_node_client::parse_node_url(&self.default_node_url)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.log_format()?;
        Ok(())
    }

    pub fn unlock_ttl(&self) -> Duration {
        Duration::from_secs(self.unlock_ttl_secs)
    }

    pub fn node_timeout(&self) -> Duration {
        Duration::from_secs(self.node_timeout_secs)
    }

    pub fn log_format(&self) -> Result<LogFormat, ConfigError> {
        self.log_format.parse()
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            default_node_url: default_node_url(),
            unlock_ttl_secs: default_unlock_ttl_secs(),
            kdf_iterations: default_kdf_iterations(),
            node_timeout_secs: default_node_timeout_secs(),
            vault_storage_key: default_vault_storage_key(),
            session_storage_key: default_session_storage_key(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = WalletConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = WalletConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = WalletConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.default_node_url, "http://localhost:7332");
        assert_eq!(config.unlock_ttl(), Duration::from_secs(900));
        assert_eq!(config.kdf_iterations, 310_000);
        assert_eq!(config.vault_storage_key, "modulr.vault.v1");
        assert_eq!(config.session_storage_key, "modulr.session.unlock.v1");
        assert_eq!(config.log_format().unwrap(), LogFormat::Human);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            unlock_ttl_secs = 60
            default_node_url = "https://node.modulr.example"
        "#;
        let config = WalletConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.unlock_ttl_secs, 60);
        assert_eq!(config.default_node_url, "https://node.modulr.example");
        assert_eq!(config.log_format, "human"); // default
    }

    #[test]
    fn zero_values_rejected() {
        assert!(matches!(
            WalletConfig::from_toml_str("kdf_iterations = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            WalletConfig::from_toml_str("unlock_ttl_secs = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            WalletConfig::from_toml_str("kdf_iterations = 4000000"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn bad_values_rejected() {
        assert!(WalletConfig::from_toml_str("log_format = \"xml\"").is_err());
        assert!(WalletConfig::from_toml_str("default_node_url = \"ftp://x\"").is_err());
        assert!(matches!(
            WalletConfig::from_toml_str("unlock_ttl_secs = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_returns_io_error() {
        let result = WalletConfig::from_toml_file("/nonexistent/modulr.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.toml");
        std::fs::write(&path, "node_timeout_secs = 5\n").unwrap();
        let config = WalletConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.node_timeout(), Duration::from_secs(5));
    }
}
