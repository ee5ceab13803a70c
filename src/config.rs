use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde_derive::Deserialize;
use std::str::FromStr;
use std::time::Duration;

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl AppConfig {
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(self.log_level.as_str()).unwrap_or(tracing::Level::INFO)
    }
}

pub(crate) fn load_app_config() -> Result<AppConfig> {
    envy::from_env::<AppConfig>()
        .map_err(ConfigError::env_parse)
        .context("Failed to load AppConfig")
}

fn default_start_year() -> i32 {
    2020
}

fn default_politeness_delay_ms() -> u64 {
    1000
}

fn default_max_redirects() -> usize {
    5
}

fn default_request_timeout_sec() -> u64 {
    60
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_max_concurrent_requests() -> usize {
    4
}

fn default_page_size() -> usize {
    10000
}

fn default_lookup_batch_size() -> usize {
    500
}

#[derive(Deserialize, Debug, Clone)]
pub struct CollectorConfig {
    // first year of the collected range
    #[serde(default = "default_start_year")]
    pub start_year: i32,
    #[serde(default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default = "default_request_timeout_sec")]
    pub request_timeout_sec: u64,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_lookup_batch_size")]
    pub lookup_batch_size: usize,
}

impl CollectorConfig {
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_sec)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Rejects knobs that would stall collection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::invalid("page_size", "must be positive"));
        }
        if self.lookup_batch_size == 0 {
            return Err(ConfigError::invalid("lookup_batch_size", "must be positive"));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::invalid(
                "max_concurrent_requests",
                "must be positive",
            ));
        }
        Ok(())
    }
}

pub fn load_collector_config() -> Result<CollectorConfig> {
    envy::prefixed("COLLECTOR_").from_env::<CollectorConfig>()
        .map_err(ConfigError::env_parse)
        .context("Failed to load CollectorConfig")
}

fn default_store_root() -> String {
    "data".to_string()
}

#[derive(Deserialize, Debug, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_root")]
    pub root: String,
}

pub fn load_store_config() -> Result<StoreConfig> {
    envy::prefixed("STORE_").from_env::<StoreConfig>()
        .map_err(ConfigError::env_parse)
        .context("Failed to load StoreConfig")
}

fn default_fr_url() -> String {
    "https://www.statistiques.developpement-durable.gouv.fr".to_string()
}

fn default_dk_url() -> String {
    "https://www.statistikbanken.dk".to_string()
}

fn default_se_url() -> String {
    "https://api.scb.se/OV0104/v1/doris/sv/ssd/START/TK/TK1001/TK1001A/PersBilarDrivMedel".to_string()
}

fn default_no_url() -> String {
    "https://www.ssb.no".to_string()
}

fn default_cn_url() -> String {
    "https://data.stats.gov.cn".to_string()
}

fn default_nl_url() -> String {
    "https://opendata.rdw.nl".to_string()
}

fn default_press_release_url() -> String {
    "https://www.acea.auto".to_string()
}

/// Base URLs of the remote publishers.
#[derive(Deserialize, Debug, Clone)]
pub struct SourcesConfig {
    #[serde(default = "default_fr_url")]
    pub fr_url: String,
    #[serde(default = "default_dk_url")]
    pub dk_url: String,
    #[serde(default = "default_se_url")]
    pub se_url: String,
    #[serde(default = "default_no_url")]
    pub no_url: String,
    #[serde(default = "default_cn_url")]
    pub cn_url: String,
    #[serde(default = "default_nl_url")]
    pub nl_url: String,
    #[serde(default = "default_press_release_url")]
    pub press_release_url: String,
}

pub fn load_sources_config() -> Result<SourcesConfig> {
    envy::prefixed("SOURCE_").from_env::<SourcesConfig>()
        .map_err(ConfigError::env_parse)
        .context("Failed to load SourcesConfig")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Helper to temporarily set environment variables and restore them after
    fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let originals: Vec<(String, Option<String>)> = vars
            .iter()
            .map(|(key, _)| (key.to_string(), std::env::var(key).ok()))
            .collect();

        for (key, value) in vars {
            std::env::set_var(key, value);
        }

        let result = f();

        for (key, original) in originals {
            match original {
                Some(val) => std::env::set_var(&key, val),
                None => std::env::remove_var(&key),
            }
        }

        result
    }

    #[test]
    #[serial]
    fn test_load_app_config() {
        with_env_vars(&[("LOG_LEVEL", "debug")], || {
            let config = load_app_config().unwrap();
            assert_eq!(config.log_level, "debug");
            assert_eq!(config.log_level(), tracing::Level::DEBUG);
        });
    }

    #[test]
    #[serial]
    fn test_invalid_log_level_falls_back_to_info() {
        with_env_vars(&[("LOG_LEVEL", "chatty")], || {
            let config = load_app_config().unwrap();
            assert_eq!(config.log_level(), tracing::Level::INFO);
        });
    }

    #[test]
    #[serial]
    fn test_load_collector_config() {
        with_env_vars(
            &[
                ("COLLECTOR_START_YEAR", "2018"),
                ("COLLECTOR_POLITENESS_DELAY_MS", "250"),
                ("COLLECTOR_MAX_CONCURRENT_REQUESTS", "2"),
            ],
            || {
                let config = load_collector_config().unwrap();
                assert_eq!(config.start_year, 2018);
                assert_eq!(config.politeness_delay(), Duration::from_millis(250));
                assert_eq!(config.max_concurrent_requests, 2);
                assert_eq!(config.max_redirects, 5);
            },
        );
    }

    #[test]
    #[serial]
    fn test_load_collector_config_defaults() {
        let config = load_collector_config().unwrap();
        assert_eq!(config.start_year, 2020);
        assert_eq!(config.page_size, 10000);
        assert_eq!(config.lookup_batch_size, 500);
        assert_eq!(config.retry_delay(), Duration::from_secs(2));
    }

    #[test]
    #[serial]
    fn test_load_collector_config_invalid() {
        with_env_vars(&[("COLLECTOR_START_YEAR", "last year")], || {
            let err = load_collector_config().unwrap_err();
            assert!(err.to_string().contains("Failed to load CollectorConfig"));
        });
    }

    #[test]
    #[serial]
    fn test_validate_rejects_zero_batch() {
        with_env_vars(&[("COLLECTOR_LOOKUP_BATCH_SIZE", "0")], || {
            let config = load_collector_config().unwrap();
            let err = config.validate().unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "lookup_batch_size"));
        });
    }

    #[test]
    #[serial]
    fn test_load_store_config() {
        with_env_vars(&[("STORE_ROOT", "/var/lib/registrations")], || {
            let config = load_store_config().unwrap();
            assert_eq!(config.root, "/var/lib/registrations");
        });
    }

    #[test]
    #[serial]
    fn test_load_sources_config_override() {
        with_env_vars(&[("SOURCE_NL_URL", "http://localhost:9000")], || {
            let config = load_sources_config().unwrap();
            assert_eq!(config.nl_url, "http://localhost:9000");
            assert_eq!(config.dk_url, default_dk_url());
        });
    }
}
