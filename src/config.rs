use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::map::ReadinessPolicy;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Runtime settings, read from the environment (and `.env`) at startup
#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub map_poll_interval: Duration,
    pub map_max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        let readiness = ReadinessPolicy::default();
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            data_dir: PathBuf::from("data"),
            log_dir: PathBuf::from("logs"),
            map_poll_interval: readiness.interval,
            map_max_attempts: readiness.max_attempts,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset or blank values keep defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")),
            model: get("VITAMAP_MODEL").unwrap_or(defaults.model),
            api_base: get("VITAMAP_API_BASE").unwrap_or(defaults.api_base),
            data_dir: get("VITAMAP_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            log_dir: get("VITAMAP_LOG_DIR").map(PathBuf::from).unwrap_or(defaults.log_dir),
            map_poll_interval: parse_setting::<u64>("VITAMAP_MAP_POLL_MS", get("VITAMAP_MAP_POLL_MS"))
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.map_poll_interval),
            map_max_attempts: parse_setting::<u32>("VITAMAP_MAP_MAX_ATTEMPTS", get("VITAMAP_MAP_MAX_ATTEMPTS"))
                .filter(|n| *n > 0)
                .unwrap_or(defaults.map_max_attempts),
        }
    }

    pub fn readiness(&self) -> ReadinessPolicy {
        ReadinessPolicy {
            interval: self.map_poll_interval,
            max_attempts: self.map_max_attempts,
        }
    }
}

/// Parse a numeric setting, warning and returning `None` when it is malformed
fn parse_setting<T: FromStr>(key: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            None
        }
    }
}
