//! Client configuration, read from the environment.

use std::time::Duration;

use reglas_api::{ReglasApi, DEFAULT_BASE_URL};
use thiserror::Error;

use crate::operator::RangeEncoding;
use crate::ApiError;

/// Delay between the login welcome banner and the redirect.
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(800);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid REGLAS_REDIRECT_DELAY_MS '{0}': expected milliseconds")]
    InvalidDelay(String),

    #[error("Invalid REGLAS_RANGE_OPERATOR: {0}")]
    InvalidRangeEncoding(String),

    #[error("API client error: {0}")]
    Api(#[from] ApiError),
}

/// Configuration for the rule-management client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the backend API.
    pub api_url: String,

    /// Path registration forms are posted to.
    pub register_path: String,

    pub redirect_delay: Duration,

    /// How the range operator is sent to the server.
    pub range_encoding: RangeEncoding,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            register_path: "/register".to_string(),
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            range_encoding: RangeEncoding::default(),
        }
    }

    /// Read `REGLAS_API_URL`, `REGLAS_REGISTER_PATH`,
    /// `REGLAS_REDIRECT_DELAY_MS` and `REGLAS_RANGE_OPERATOR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::new(lookup("REGLAS_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()));

        if let Some(path) = lookup("REGLAS_REGISTER_PATH") {
            config.register_path = path;
        }

        if let Some(raw) = lookup("REGLAS_REDIRECT_DELAY_MS") {
            let millis: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidDelay(raw.clone()))?;
            config.redirect_delay = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup("REGLAS_RANGE_OPERATOR") {
            config.range_encoding = raw.parse().map_err(ConfigError::InvalidRangeEncoding)?;
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_register_path(mut self, path: impl Into<String>) -> Self {
        self.register_path = path.into();
        self
    }

    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    pub fn with_range_encoding(mut self, encoding: RangeEncoding) -> Self {
        self.range_encoding = encoding;
        self
    }

    /// Build the HTTP client for this configuration.
    pub fn build_client(&self) -> Result<ReglasApi, ConfigError> {
        Ok(ReglasApi::new(&self.api_url)?.with_register_path(&self.register_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_BASE_URL);
        assert_eq!(config.redirect_delay, DEFAULT_REDIRECT_DELAY);
        assert_eq!(config.range_encoding, RangeEncoding::Equals);
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("REGLAS_API_URL", "http://reglas.local:9000"),
            ("REGLAS_REDIRECT_DELAY_MS", "1000"),
            ("REGLAS_RANGE_OPERATOR", "preserve"),
            ("REGLAS_REGISTER_PATH", "/users-form"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "http://reglas.local:9000");
        assert_eq!(config.redirect_delay, Duration::from_millis(1000));
        assert_eq!(config.range_encoding, RangeEncoding::Preserve);
        assert_eq!(config.register_path, "/users-form");
    }

    #[test]
    fn test_invalid_delay() {
        let err = ClientConfig::from_lookup(lookup(&[("REGLAS_REDIRECT_DELAY_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDelay(_)));
    }

    #[test]
    fn test_build_client() {
        let client = ClientConfig::new("http://localhost:8000/").build_client().unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert!(ClientConfig::new("ftp://nope").build_client().is_err());
    }
}
