//! Explorer configuration with validation.
//!
//! Defaults, then an optional JSON file, then `EXPLORER_*` environment
//! overrides.

use qx_01_block_store::RetryPolicy;
use qx_02_derived_cache::{CachePolicy, DerivedKey};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use super::statistics::GRAPH_WINDOW_BLOCKS;

/// Main explorer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// Derived-value cache expiry
    pub cache: CacheConfig,
    /// Heaviest-block access key
    pub access: AccessConfig,
    /// Block store retry behaviour
    pub store: StoreConfig,
    /// Chain statistics parameters
    pub statistics: StatisticsConfig,
}

impl ExplorerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout cannot be 0".into(),
            ));
        }

        if self.store.retry_attempts == 0 {
            return Err(ConfigError::Invalid(
                "store.retry_attempts must be at least 1".into(),
            ));
        }

        if self.store.retry_max_delay < self.store.retry_base_delay {
            return Err(ConfigError::InvalidTimeout(
                "store.retry_max_delay is below store.retry_base_delay".into(),
            ));
        }

        if self.statistics.graph_window_blocks == 0 {
            return Err(ConfigError::Invalid(
                "statistics.graph_window_blocks cannot be 0".into(),
            ));
        }

        for (key, ttl) in self.cache.entries() {
            if ttl.is_some_and(|t| t.is_zero()) {
                return Err(ConfigError::InvalidTimeout(format!(
                    "cache ttl for {} cannot be 0",
                    key
                )));
            }
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }

    /// Parse a JSON configuration document; missing fields take defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `EXPLORER_*` overrides read through `lookup`.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `EXPLORER_HOST` | `http.host` |
    /// | `EXPLORER_PORT` | `http.port` |
    /// | `EXPLORER_REQUEST_TIMEOUT` | `http.request_timeout` |
    /// | `EXPLORER_MAJOR_BLOCK_KEY` | `access.major_block_key` |
    /// | `EXPLORER_CACHE_TTL` | every `cache.*_ttl` |
    /// | `EXPLORER_STORE_RETRY_ATTEMPTS` | `store.retry_attempts` |
    /// | `EXPLORER_STORE_CALL_TIMEOUT` | `store.call_timeout` |
    /// | `EXPLORER_GRAPH_WINDOW` | `statistics.graph_window_blocks` |
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("EXPLORER_HOST") {
            self.http.host = parse_env("EXPLORER_HOST", &host)?;
        }
        if let Some(port) = lookup("EXPLORER_PORT") {
            self.http.port = parse_env("EXPLORER_PORT", &port)?;
        }
        if let Some(timeout) = lookup("EXPLORER_REQUEST_TIMEOUT") {
            self.http.request_timeout = parse_duration_env("EXPLORER_REQUEST_TIMEOUT", &timeout)?;
        }
        if let Some(key) = lookup("EXPLORER_MAJOR_BLOCK_KEY") {
            self.access.major_block_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Some(ttl) = lookup("EXPLORER_CACHE_TTL") {
            let ttl = parse_duration_env("EXPLORER_CACHE_TTL", &ttl)?;
            self.cache = CacheConfig::uniform(ttl);
        }
        if let Some(attempts) = lookup("EXPLORER_STORE_RETRY_ATTEMPTS") {
            self.store.retry_attempts = parse_env("EXPLORER_STORE_RETRY_ATTEMPTS", &attempts)?;
        }
        if let Some(timeout) = lookup("EXPLORER_STORE_CALL_TIMEOUT") {
            self.store.call_timeout =
                Some(parse_duration_env("EXPLORER_STORE_CALL_TIMEOUT", &timeout)?);
        }
        if let Some(window) = lookup("EXPLORER_GRAPH_WINDOW") {
            self.statistics.graph_window_blocks = parse_env("EXPLORER_GRAPH_WINDOW", &window)?;
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { name, value: value.to_string() })
}

fn parse_duration_env(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    humantime_serde::parse_duration(value).map_err(|_| ConfigError::Env {
        name,
        value: value.to_string(),
    })
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port
    pub port: u16,
    /// Per-request deadline
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Allow cross-origin requests from any origin
    pub cors_allow_any_origin: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8000,
            request_timeout: Duration::from_secs(30),
            cors_allow_any_origin: true,
        }
    }
}

/// Per-key cache expiry. `None` keeps a value until it is invalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    #[serde(with = "humantime_serde::option")]
    pub latest_block_height_ttl: Option<Duration>,
    #[serde(with = "humantime_serde::option")]
    pub latest_block_ttl: Option<Duration>,
    #[serde(with = "humantime_serde::option")]
    pub total_emission_ttl: Option<Duration>,
    #[serde(with = "humantime_serde::option")]
    pub graph_data_ttl: Option<Duration>,
}

impl CacheConfig {
    pub fn uniform(ttl: Duration) -> Self {
        Self {
            latest_block_height_ttl: Some(ttl),
            latest_block_ttl: Some(ttl),
            total_emission_ttl: Some(ttl),
            graph_data_ttl: Some(ttl),
        }
    }

    fn entries(&self) -> [(DerivedKey, Option<Duration>); 4] {
        [
            (DerivedKey::LatestBlockHeight, self.latest_block_height_ttl),
            (DerivedKey::LatestBlock, self.latest_block_ttl),
            (DerivedKey::TotalEmission, self.total_emission_ttl),
            (DerivedKey::GraphData, self.graph_data_ttl),
        ]
    }

    pub fn policy(&self) -> CachePolicy {
        self.entries()
            .into_iter()
            .fold(CachePolicy::never_expire(), |policy, (key, ttl)| match ttl {
                Some(ttl) => policy.with_ttl(key, ttl),
                None => policy,
            })
    }
}

/// Access key for the heaviest-block query
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// Shared secret; unset rejects every request
    pub major_block_key: Option<String>,
}

impl std::fmt::Debug for AccessConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessConfig")
            .field(
                "major_block_key",
                &self.major_block_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Block store retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Total attempts per call, including the first
    pub retry_attempts: u32,
    #[serde(with = "humantime_serde")]
    pub retry_base_delay: Duration,
    #[serde(with = "humantime_serde")]
    pub retry_max_delay: Duration,
    /// Deadline for a single store call
    #[serde(with = "humantime_serde::option")]
    pub call_timeout: Option<Duration>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            retry_attempts: policy.max_attempts,
            retry_base_delay: policy.base_delay,
            retry_max_delay: policy.max_delay,
            call_timeout: policy.call_timeout,
        }
    }
}

impl StoreConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts,
            base_delay: self.retry_base_delay,
            max_delay: self.retry_max_delay,
            call_timeout: self.call_timeout,
        }
    }
}

/// Chain statistics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Blocks below the tip in the charting window
    pub graph_window_blocks: u64,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            graph_window_blocks: GRAPH_WINDOW_BLOCKS,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// Unparseable environment override
    #[error("invalid value for {name}: {value:?}")]
    Env { name: &'static str, value: String },
    /// Unparseable configuration document
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Humantime serde module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    fn format_duration(duration: &Duration) -> String {
        if duration.subsec_millis() != 0 {
            format!("{}ms", duration.as_millis())
        } else {
            format!("{}s", duration.as_secs())
        }
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .ok()
                .and_then(|m| m.checked_mul(60))
                .map(Duration::from_secs)
                .ok_or("invalid minutes")
        } else if let Some(hours) = s.strip_suffix('h') {
            hours
                .trim()
                .parse::<u64>()
                .ok()
                .and_then(|h| h.checked_mul(3600))
                .map(Duration::from_secs)
                .ok_or("invalid hours")
        } else {
            // Try parsing as plain seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }

    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};
        use std::time::Duration;

        pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match duration {
                Some(d) => super::serialize(d, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(s) => super::parse_duration(&s)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ExplorerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.http_addr().port(), 8000);
        assert_eq!(config.statistics.graph_window_blocks, 4320);
        assert!(config.access.major_block_key.is_none());
        assert_eq!(config.cache.policy(), CachePolicy::never_expire());
    }

    #[test]
    fn test_partial_json_document() {
        let config = ExplorerConfig::from_json(
            r#"{
                "http": { "port": 9100 },
                "cache": { "latest_block_height_ttl": "30s", "graph_data_ttl": "5m" },
                "store": { "retry_base_delay": "20ms" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.http.port, 9100);
        assert_eq!(config.http.request_timeout, Duration::from_secs(30));
        let policy = config.cache.policy();
        assert_eq!(
            policy.ttl_for(DerivedKey::LatestBlockHeight),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            policy.ttl_for(DerivedKey::GraphData),
            Some(Duration::from_secs(300))
        );
        assert_eq!(policy.ttl_for(DerivedKey::TotalEmission), None);
        assert_eq!(
            config.store.retry_policy().base_delay,
            Duration::from_millis(20)
        );
    }

    #[test]
    fn test_bad_json_duration() {
        assert!(matches!(
            ExplorerConfig::from_json(r#"{ "http": { "request_timeout": "soon" } }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ExplorerConfig::default();
        config
            .apply_env_overrides(env(&[
                ("EXPLORER_PORT", "8080"),
                ("EXPLORER_MAJOR_BLOCK_KEY", "s3cret"),
                ("EXPLORER_CACHE_TTL", "10s"),
                ("EXPLORER_GRAPH_WINDOW", "100"),
            ]))
            .unwrap();

        assert_eq!(config.http.port, 8080);
        assert_eq!(config.access.major_block_key.as_deref(), Some("s3cret"));
        assert_eq!(config.cache, CacheConfig::uniform(Duration::from_secs(10)));
        assert_eq!(config.statistics.graph_window_blocks, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_override_rejects_garbage() {
        let mut config = ExplorerConfig::default();
        let err = config
            .apply_env_overrides(env(&[("EXPLORER_PORT", "eighty")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Env {
                name: "EXPLORER_PORT",
                value: "eighty".into()
            }
        );
    }

    #[test]
    fn test_oversized_duration_is_rejected() {
        assert_eq!(
            humantime_serde::parse_duration("99999999999999999h"),
            Err("invalid hours")
        );
        assert_eq!(
            humantime_serde::parse_duration("999999999999999999m"),
            Err("invalid minutes")
        );
        assert_eq!(
            humantime_serde::parse_duration("2h"),
            Ok(Duration::from_secs(7200))
        );

        let mut config = ExplorerConfig::default();
        let err = config
            .apply_env_overrides(env(&[("EXPLORER_CACHE_TTL", "99999999999999999h")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Env {
                name: "EXPLORER_CACHE_TTL",
                value: "99999999999999999h".into()
            }
        );
    }

    #[test]
    fn test_validation() {
        let mut config = ExplorerConfig::default();
        config.store.retry_attempts = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ExplorerConfig::default();
        config.cache.total_emission_ttl = Some(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_access_key_is_redacted() {
        let config = AccessConfig {
            major_block_key: Some("s3cret".into()),
        };
        assert!(!format!("{:?}", config).contains("s3cret"));
    }
}
