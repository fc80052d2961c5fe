//! Exchange-rate source configuration.
//!
//! Layers, lowest precedence first: built-in defaults, an optional YAML or
//! JSON file, then `EMI_RATES_URL` / `EMI_RATES_TIMEOUT_SECS` from the
//! environment.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::EmiError;
use crate::EmiResult;

pub const DEFAULT_RATES_ENDPOINT: &str = "https://open.er-api.com/v6/latest/USD";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

pub const ENV_RATES_URL: &str = "EMI_RATES_URL";
pub const ENV_RATES_TIMEOUT: &str = "EMI_RATES_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateSourceConfig {
    /// GET endpoint returning `{"rates": {...}}` with base USD.
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for RateSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RATES_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RateSourceConfig {
    /// Defaults, overlaid by `path` when given, overlaid by the process
    /// environment.
    pub fn load(path: Option<&Path>) -> EmiResult<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        let config = config.with_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file. `.yaml`/`.yml` parse as YAML, anything else as JSON.
    pub fn from_file(path: &Path) -> EmiResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EmiError::Config(format!("failed to read '{}': {e}", path.display())))?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            serde_yaml::from_str(&contents)
                .map_err(|e| EmiError::Config(format!("failed to parse '{}': {e}", path.display())))
        } else {
            serde_json::from_str(&contents)
                .map_err(|e| EmiError::Config(format!("failed to parse '{}': {e}", path.display())))
        }
    }

    /// Apply overrides from an environment lookup.
    pub fn with_env<F>(mut self, lookup: F) -> EmiResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_RATES_URL) {
            self.endpoint = url;
        }
        if let Some(raw) = lookup(ENV_RATES_TIMEOUT) {
            self.timeout_secs = raw.trim().parse().map_err(|_| {
                EmiError::Config(format!("{ENV_RATES_TIMEOUT} must be a whole number of seconds, got '{raw}'"))
            })?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> EmiResult<()> {
        let url = Url::parse(&self.endpoint)
            .map_err(|e| EmiError::Config(format!("invalid endpoint '{}': {e}", self.endpoint)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(EmiError::Config(format!(
                "endpoint must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(EmiError::Config("timeout_secs must be greater than 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = RateSourceConfig::default();
        assert_eq!(config.endpoint, DEFAULT_RATES_ENDPOINT);
        assert_eq!(config.timeout_secs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = RateSourceConfig::default()
            .with_env(env(&[
                (ENV_RATES_URL, "http://localhost:8080/latest"),
                (ENV_RATES_TIMEOUT, "3"),
            ]))
            .unwrap();
        assert_eq!(
            config,
            RateSourceConfig {
                endpoint: "http://localhost:8080/latest".into(),
                timeout_secs: 3,
            }
        );
    }

    #[test]
    fn test_env_bad_timeout() {
        let err = RateSourceConfig::default()
            .with_env(env(&[(ENV_RATES_TIMEOUT, "soon")]))
            .unwrap_err();
        assert!(matches!(err, EmiError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let config = RateSourceConfig {
            endpoint: "ftp://rates.example".into(),
            timeout_secs: 5,
        };
        assert!(config.validate().is_err());

        let config = RateSourceConfig {
            endpoint: "not a url".into(),
            timeout_secs: 5,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: RateSourceConfig = serde_yaml::from_str("timeout_secs: 2\n").unwrap();
        assert_eq!(config.endpoint, DEFAULT_RATES_ENDPOINT);
        assert_eq!(config.timeout_secs, 2);
    }
}
