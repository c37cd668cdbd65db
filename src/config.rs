//! Runtime configuration, read from `CERONIX_*` environment variables
//! (a `.env` file is loaded first by the binary).

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::mock::MockScenario;
use crate::reading::ReadingSchema;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend_url: String,       // single origin for every endpoint
    pub reading_path: String,      // live reading endpoint
    pub labels_path: String,       // label detection endpoint
    pub scratch_path: String,      // scratch detection endpoint
    pub poll_interval: Duration,   // time between reading polls
    pub reading_timeout: Duration, // per-poll request timeout
    pub upload_timeout: Duration,  // per-upload request timeout
    pub mock_delay: Duration,      // pause before showing mock data
    pub schema: ReadingSchema,
    pub scenario: MockScenario,
    pub placeholder_image: PathBuf, // shown when an upload fails
    pub log_dir: PathBuf,
    pub export_history: bool, // write history CSV on shutdown
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8000".to_string(),
            reading_path: "/l293d".to_string(),
            labels_path: "/predict1".to_string(),
            scratch_path: "/predict2".to_string(),
            poll_interval: Duration::from_millis(2000),
            reading_timeout: Duration::from_millis(1500),
            upload_timeout: Duration::from_secs(60),
            mock_delay: Duration::ZERO,
            schema: ReadingSchema::Full,
            scenario: MockScenario::Healthy,
            placeholder_image: PathBuf::from("assets/background.png"),
            log_dir: PathBuf::from("logs"),
            export_history: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = lookup("CERONIX_BACKEND_URL") {
            config.backend_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(path) = lookup("CERONIX_READING_PATH") {
            config.reading_path = path;
        }
        if let Some(path) = lookup("CERONIX_LABELS_PATH") {
            config.labels_path = path;
        }
        if let Some(path) = lookup("CERONIX_SCRATCH_PATH") {
            config.scratch_path = path;
        }
        if let Some(ms) = parse_nonzero(&lookup, "CERONIX_POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_nonzero(&lookup, "CERONIX_READING_TIMEOUT_MS")? {
            config.reading_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_nonzero(&lookup, "CERONIX_UPLOAD_TIMEOUT_SECS")? {
            config.upload_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse::<u64, _>(&lookup, "CERONIX_MOCK_DELAY_MS")? {
            config.mock_delay = Duration::from_millis(ms);
        }
        if let Some(schema) = parse(&lookup, "CERONIX_READING_SCHEMA")? {
            config.schema = schema;
        }
        if let Some(scenario) = parse(&lookup, "CERONIX_MOCK_SCENARIO")? {
            config.scenario = scenario;
        }
        if let Some(path) = lookup("CERONIX_PLACEHOLDER_IMAGE") {
            config.placeholder_image = PathBuf::from(path);
        }
        if let Some(dir) = lookup("CERONIX_LOG_DIR") {
            config.log_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("CERONIX_EXPORT_HISTORY") {
            config.export_history = parse_bool("CERONIX_EXPORT_HISTORY", &raw)?;
        }

        Ok(config)
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}

/// Intervals and timeouts: zero would fire or expire immediately.
fn parse_nonzero<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse::<u64, F>(lookup, key)? {
        Some(0) => Err(ConfigError::Invalid {
            key,
            value: "0".to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        other => Ok(other),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.reading_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("CERONIX_BACKEND_URL", "http://10.0.0.5:8001/"),
            ("CERONIX_POLL_INTERVAL_MS", "1000"),
            ("CERONIX_READING_SCHEMA", "motor"),
            ("CERONIX_MOCK_SCENARIO", "coin-flip"),
            ("CERONIX_EXPORT_HISTORY", "no"),
        ]))
        .unwrap();

        assert_eq!(config.backend_url, "http://10.0.0.5:8001");
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.schema, ReadingSchema::Motor);
        assert_eq!(config.scenario, MockScenario::CoinFlip);
        assert!(!config.export_history);
    }

    #[test]
    fn rejects_zero_intervals_and_timeouts() {
        for key in [
            "CERONIX_POLL_INTERVAL_MS",
            "CERONIX_READING_TIMEOUT_MS",
            "CERONIX_UPLOAD_TIMEOUT_SECS",
        ] {
            let err = Config::from_lookup(lookup_from(&[(key, "0")])).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { key: k, .. } if k == key),
                "{} accepted zero",
                key
            );
        }

        // A zero mock delay just means no delay.
        let config = Config::from_lookup(lookup_from(&[("CERONIX_MOCK_DELAY_MS", "0")])).unwrap();
        assert_eq!(config.mock_delay, Duration::ZERO);
    }

    #[test]
    fn rejects_bad_values() {
        let err = Config::from_lookup(lookup_from(&[("CERONIX_READING_TIMEOUT_MS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CERONIX_READING_TIMEOUT_MS", .. }));

        assert!(Config::from_lookup(lookup_from(&[("CERONIX_POLL_INTERVAL_MS", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("CERONIX_EXPORT_HISTORY", "maybe")])).is_err());
    }
}
