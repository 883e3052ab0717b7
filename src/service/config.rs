use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::SifenError;

const TEST_BASE_URL: &str = "https://sifen-test.set.gov.py";
const PRODUCTION_BASE_URL: &str = "https://sifen.set.gov.py";
const TAXPAYER_SERVICE_PATH: &str = "/de/ws/consultas/consulta-ruc.wsdl";
const DOCUMENT_SERVICE_PATH: &str = "/de/ws/consultas/consulta.wsdl";

/// SIFEN deployment to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Test,
    Production,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Self::Test => TEST_BASE_URL,
            Self::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl FromStr for Environment {
    type Err = SifenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(Self::Test),
            "production" => Ok(Self::Production),
            other => Err(SifenError::Config(format!(
                "environment must be 'test' or 'production', got '{other}'"
            ))),
        }
    }
}

/// Lookup service settings.
///
/// Deserializable from any serde source; [`SifenConfig::from_env`] reads the
/// `SIFEN_*` environment variables. Missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SifenConfig {
    /// Test or production endpoints. Default: test.
    pub environment: Environment,
    /// Cache successful lookups. Default: `true`.
    pub cache_enabled: bool,
    /// TTL for taxpayer results, seconds. Default: 3600.
    pub ruc_ttl_secs: u64,
    /// TTL for document results, seconds. Default: 7200.
    pub dte_ttl_secs: u64,
    /// Maximum entries per cache. Default: 10 000.
    pub cache_capacity: u64,
    /// Timeout a transport should apply to one SOAP call, seconds. Default: 30.
    pub request_timeout_secs: u64,
}

impl Default for SifenConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Test,
            cache_enabled: true,
            ruc_ttl_secs: 3600,
            dte_ttl_secs: 7200,
            cache_capacity: 10_000,
            request_timeout_secs: 30,
        }
    }
}

impl SifenConfig {
    /// Load from `SIFEN_ENVIRONMENT`, `SIFEN_CACHE_ENABLED`, `SIFEN_TTL_RUC`,
    /// `SIFEN_TTL_DTE`, `SIFEN_CACHE_CAPACITY` and `SIFEN_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// [`SifenError::Config`] when a variable is set but invalid.
    pub fn from_env() -> Result<Self, SifenError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SifenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let config = Self {
            environment: var("SIFEN_ENVIRONMENT")
                .map(|v| v.parse::<Environment>())
                .transpose()?
                .unwrap_or(defaults.environment),
            cache_enabled: var("SIFEN_CACHE_ENABLED")
                .map(|v| parse_flag("SIFEN_CACHE_ENABLED", &v))
                .transpose()?
                .unwrap_or(defaults.cache_enabled),
            ruc_ttl_secs: var("SIFEN_TTL_RUC")
                .map(|v| parse_number("SIFEN_TTL_RUC", &v))
                .transpose()?
                .unwrap_or(defaults.ruc_ttl_secs),
            dte_ttl_secs: var("SIFEN_TTL_DTE")
                .map(|v| parse_number("SIFEN_TTL_DTE", &v))
                .transpose()?
                .unwrap_or(defaults.dte_ttl_secs),
            cache_capacity: var("SIFEN_CACHE_CAPACITY")
                .map(|v| parse_number("SIFEN_CACHE_CAPACITY", &v))
                .transpose()?
                .unwrap_or(defaults.cache_capacity),
            request_timeout_secs: var("SIFEN_TIMEOUT_SECS")
                .map(|v| parse_number("SIFEN_TIMEOUT_SECS", &v))
                .transpose()?
                .unwrap_or(defaults.request_timeout_secs),
        };
        config.validate()?;

        tracing::info!(
            environment = ?config.environment,
            cache_enabled = config.cache_enabled,
            "configuration loaded"
        );
        tracing::debug!(
            ruc_ttl = config.ruc_ttl_secs,
            dte_ttl = config.dte_ttl_secs,
            capacity = config.cache_capacity,
            timeout = config.request_timeout_secs,
            "cache and transport settings"
        );
        Ok(config)
    }

    /// Reject settings no cache or transport could honour.
    pub fn validate(&self) -> Result<(), SifenError> {
        if self.request_timeout_secs == 0 {
            return Err(SifenError::Config("request timeout must be positive".into()));
        }
        if self.cache_enabled {
            if self.ruc_ttl_secs == 0 || self.dte_ttl_secs == 0 {
                return Err(SifenError::Config("cache TTLs must be positive".into()));
            }
            if self.cache_capacity == 0 {
                return Err(SifenError::Config("cache capacity must be positive".into()));
            }
        }
        Ok(())
    }

    pub fn base_url(&self) -> &'static str {
        self.environment.base_url()
    }

    /// WSDL endpoint of the RUC consultation service.
    pub fn taxpayer_service_url(&self) -> String {
        format!("{}{TAXPAYER_SERVICE_PATH}", self.base_url())
    }

    /// WSDL endpoint of the DTE consultation service.
    pub fn document_service_url(&self) -> String {
        format!("{}{DOCUMENT_SERVICE_PATH}", self.base_url())
    }

    pub fn ruc_ttl(&self) -> Duration {
        Duration::from_secs(self.ruc_ttl_secs)
    }

    pub fn dte_ttl(&self) -> Duration {
        Duration::from_secs(self.dte_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_number(name: &str, value: &str) -> Result<u64, SifenError> {
    value
        .trim()
        .parse()
        .map_err(|_| SifenError::Config(format!("{name} must be a non-negative integer, got '{value}'")))
}

fn parse_flag(name: &str, value: &str) -> Result<bool, SifenError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SifenError::Config(format!("{name} must be a boolean, got '{value}'"))),
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
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = SifenConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, SifenConfig::default());
        assert_eq!(
            config.taxpayer_service_url(),
            "https://sifen-test.set.gov.py/de/ws/consultas/consulta-ruc.wsdl"
        );
        assert_eq!(config.dte_ttl(), Duration::from_secs(7200));
    }

    #[test]
    fn reads_every_variable() {
        let config = SifenConfig::from_lookup(lookup(&[
            ("SIFEN_ENVIRONMENT", "Production"),
            ("SIFEN_CACHE_ENABLED", "false"),
            ("SIFEN_TTL_RUC", "60"),
            ("SIFEN_TTL_DTE", "120"),
            ("SIFEN_CACHE_CAPACITY", "500"),
            ("SIFEN_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.cache_enabled);
        assert_eq!(config.ruc_ttl_secs, 60);
        assert_eq!(config.dte_ttl_secs, 120);
        assert_eq!(config.cache_capacity, 500);
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(
            config.document_service_url(),
            "https://sifen.set.gov.py/de/ws/consultas/consulta.wsdl"
        );
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for vars in [
            [("SIFEN_ENVIRONMENT", "staging")],
            [("SIFEN_TTL_RUC", "-1")],
            [("SIFEN_CACHE_ENABLED", "maybe")],
            [("SIFEN_TIMEOUT_SECS", "0")],
            [("SIFEN_CACHE_CAPACITY", "0")],
        ] {
            let err = SifenConfig::from_lookup(lookup(&vars)).unwrap_err();
            assert!(matches!(err, SifenError::Config(_)), "{vars:?}");
        }
    }

    #[test]
    fn zero_ttl_is_fine_when_cache_is_off() {
        let config = SifenConfig::from_lookup(lookup(&[
            ("SIFEN_CACHE_ENABLED", "0"),
            ("SIFEN_TTL_RUC", "0"),
        ]))
        .unwrap();
        assert!(!config.cache_enabled);
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: SifenConfig =
            serde_json::from_str(r#"{"environment":"production","dte_ttl_secs":60}"#).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.dte_ttl_secs, 60);
        assert_eq!(config.ruc_ttl_secs, 3600);
    }
}
