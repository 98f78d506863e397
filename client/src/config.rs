use std::fmt;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::api::{Credentials, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "limtel.yaml";

/// Prefix for environment overrides, e.g. `LIMTEL_API__API_KEY`.
pub const ENV_PREFIX: &str = "LIMTEL_";

/// Client configuration loaded from multiple sources.
///
/// Configuration is loaded in priority order (lowest to highest):
/// 1. Struct defaults
/// 2. limtel.yaml file (if exists)
/// 3. Environment variables with LIMTEL_ prefix (always wins)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Listener URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Account email (required, no compiled-in default).
    #[serde(default)]
    pub email: String,

    /// MD5 hex digest of the account password (required).
    #[serde(default)]
    pub password_hash: String,

    /// Account API key (required).
    #[serde(default)]
    pub api_key: String,
}

impl ApiConfig {
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.email, &self.password_hash, &self.api_key)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            email: String::new(),
            password_hash: String::new(),
            api_key: String::new(),
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

// These functions cannot be const because serde uses function pointers for defaults
#[allow(clippy::missing_const_for_fn)]
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Sources are merged in priority order:
    /// 1. Struct defaults (lowest)
    /// 2. limtel.yaml file (if exists)
    /// 3. Environment variables with LIMTEL_ prefix (highest)
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration with a custom YAML file path.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load_from(yaml_path: &str) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(yaml_path).extract()?;

        config.validate()?;
        Ok(config)
    }

    /// The layered provider stack, before extraction.
    #[must_use]
    pub fn figment(yaml_path: &str) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file(yaml_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.email.is_empty() {
            return Err(ConfigError::Validation(
                "api.email is required. Set LIMTEL_API__EMAIL environment variable or configure in limtel.yaml.".into(),
            ));
        }

        if self.api.password_hash.is_empty() {
            return Err(ConfigError::Validation(
                "api.password_hash is required. Set LIMTEL_API__PASSWORD_HASH environment variable or configure in limtel.yaml.".into(),
            ));
        }

        if self.api.api_key.is_empty() {
            return Err(ConfigError::Validation(
                "api.api_key is required. Set LIMTEL_API__API_KEY environment variable or configure in limtel.yaml.".into(),
            ));
        }

        if self.api.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "api.timeout_secs cannot be 0".into(),
            ));
        }

        let endpoint = &self.api.endpoint;
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "api.endpoint '{endpoint}' must start with http:// or https://"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.api.email = "e@x.com".into();
        config.api.password_hash = "abc".into();
        config.api.api_key = "k1".into();
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.api.timeout(), Duration::from_secs(10));
        assert_eq!(config.logging.level, "warn");
        assert!(config.api.email.is_empty());
        assert!(config.api.password_hash.is_empty());
        assert!(config.api.api_key.is_empty());
    }

    #[test]
    fn test_validation_accepts_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_credentials_from_config() {
        let credentials = valid_config().api.credentials();
        assert_eq!(credentials.email(), "e@x.com");
        assert_eq!(credentials.password_hash(), "abc");
        assert_eq!(credentials.api_key(), "k1");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug = format!("{:?}", valid_config());
        assert!(debug.contains("e@x.com"));
        assert!(!debug.contains("\"abc\""));
        assert!(!debug.contains("\"k1\""));
    }

    #[test]
    fn required_field_boundaries() {
        let cases: [(fn(&mut Config), &str); 3] = [
            (|c| c.api.email.clear(), "api.email"),
            (|c| c.api.password_hash.clear(), "api.password_hash"),
            (|c| c.api.api_key.clear(), "api.api_key"),
        ];

        for (mutate, field) in cases {
            let mut config = valid_config();
            mutate(&mut config);
            let result = config.validate();
            assert!(result.is_err(), "case '{field}' should fail");
            assert!(result.unwrap_err().to_string().contains(field));
        }
    }

    #[test]
    fn timeout_boundaries() {
        let cases = [
            (0u64, false, "zero timeout"),
            (1, true, "minimum valid"),
            (10, true, "default value"),
            (300, true, "long timeout"),
        ];

        for (secs, should_pass, desc) in cases {
            let mut config = valid_config();
            config.api.timeout_secs = secs;
            let result = config.validate();
            assert_eq!(result.is_ok(), should_pass, "case '{}': {:?}", desc, result);
        }
    }

    #[test]
    fn endpoint_boundaries() {
        let cases = [
            ("http://www.limtel.pl/api/api_listener.php", true, "default"),
            ("https://api.example.com/listener", true, "https"),
            ("http://127.0.0.1:8080/api", true, "local with port"),
            ("ftp://files.example.com", false, "ftp scheme"),
            ("www.limtel.pl/api", false, "no scheme"),
            ("", false, "empty"),
        ];

        for (endpoint, should_pass, desc) in cases {
            let mut config = valid_config();
            config.api.endpoint = endpoint.into();
            let result = config.validate();
            assert_eq!(result.is_ok(), should_pass, "case '{}': {:?}", desc, result);
        }
    }
}
