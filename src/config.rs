use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::job::StoreOptions;
use crate::remote::RetryPolicy;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got '{value}'")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Root of the jobs service, e.g. http://localhost:5000
    pub api_base_url: String,

    /// Per-request HTTP timeout
    /// Default: 10s
    pub request_timeout: Duration,

    /// Upper bound for a store operation waiting on the service, after
    /// which the busy flag is released
    /// Default: 30s
    pub mutation_timeout: Duration,

    /// Retries for idempotent requests; 1 attempt means no retry
    pub retry: RetryPolicy,

    /// Concurrent requests while loading demo data
    pub bulk_concurrency: usize,

    /// Directory for rolling log files
    pub log_dir: PathBuf,

    /// JSON file holding the theme preference
    pub theme_file: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Optional environment variables:
    /// - API_BASE_URL: jobs service root (default: http://localhost:5000)
    /// - REQUEST_TIMEOUT_SECS: per-request timeout (default: 10)
    /// - MUTATION_TIMEOUT_SECS: store operation timeout (default: 30)
    /// - RETRY_MAX_ATTEMPTS: attempts for idempotent requests (default: 1)
    /// - RETRY_BASE_BACKOFF_MS: linear backoff step (default: 200)
    /// - BULK_CONCURRENCY: parallel requests during demo load (default: 4)
    /// - LOG_DIR: log directory (default: logs)
    /// - THEME_FILE: preference file (default: <config dir>/job-tracker/preferences.json)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = get("API_BASE_URL").unwrap_or_else(|| "http://localhost:5000".to_string());

        let request_timeout = Duration::from_secs(parse_or(&get, "REQUEST_TIMEOUT_SECS", 10, "a number of seconds")?);
        let mutation_timeout = Duration::from_secs(parse_or(&get, "MUTATION_TIMEOUT_SECS", 30, "a number of seconds")?);

        let max_attempts = parse_or(&get, "RETRY_MAX_ATTEMPTS", 1usize, "a positive integer")?;
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "RETRY_MAX_ATTEMPTS",
                value: "0".to_string(),
                expected: "a positive integer",
            });
        }
        let base_backoff = Duration::from_millis(parse_or(&get, "RETRY_BASE_BACKOFF_MS", 200, "a number of milliseconds")?);

        let bulk_concurrency = parse_or(&get, "BULK_CONCURRENCY", 4usize, "a positive integer")?.max(1);

        let log_dir = get("LOG_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("logs"));

        let theme_file = get("THEME_FILE").map(PathBuf::from).unwrap_or_else(default_theme_file);

        Ok(Config {
            api_base_url,
            request_timeout,
            mutation_timeout,
            retry: RetryPolicy {
                max_attempts,
                base_backoff,
            },
            bulk_concurrency,
            log_dir,
            theme_file,
        })
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            mutation_timeout: self.mutation_timeout,
            bulk_concurrency: self.bulk_concurrency,
        }
    }
}

fn parse_or<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match get(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            value,
            expected,
        }),
    }
}

fn default_theme_file() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("job-tracker"))
        .unwrap_or_else(|| PathBuf::from(".job-tracker"))
        .join("preferences.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn falls_back_to_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.mutation_timeout, Duration::from_secs(30));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.bulk_concurrency, 4);
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert!(config.theme_file.ends_with("preferences.json"));
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("API_BASE_URL", "https://jobs.example.com/api"),
            ("RETRY_MAX_ATTEMPTS", "3"),
            ("RETRY_BASE_BACKOFF_MS", "50"),
            ("MUTATION_TIMEOUT_SECS", "5"),
            ("THEME_FILE", "/tmp/prefs.json"),
        ])
        .unwrap();

        assert_eq!(config.api_base_url, "https://jobs.example.com/api");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_backoff, Duration::from_millis(50));
        assert_eq!(config.store_options().mutation_timeout, Duration::from_secs(5));
        assert_eq!(config.theme_file, PathBuf::from("/tmp/prefs.json"));
    }

    #[test]
    fn rejects_malformed_numbers() {
        let err = config_from(&[("REQUEST_TIMEOUT_SECS", "soon")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "REQUEST_TIMEOUT_SECS",
                value: "soon".to_string(),
                expected: "a number of seconds",
            }
        );

        assert!(config_from(&[("RETRY_MAX_ATTEMPTS", "0")]).is_err());
    }
}
