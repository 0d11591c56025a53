//! Server configuration from environment variables.
//!
//! `HOST`, `PORT`, `INACTIVITY_TIMEOUT_HOURS`, `CLEANUP_INTERVAL_MINS` and
//! `MAX_CONFLICT_RETRIES`. Unset or unparsable values fall back to the defaults below.

use crate::service::DEFAULT_MAX_CONFLICT_RETRIES;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tournaments not accessed for this long are removed.
    pub inactivity_timeout: Duration,
    /// How often the cleanup task runs.
    pub cleanup_interval: Duration,
    pub max_conflict_retries: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_inactivity_hours() -> u64 {
    12
}

fn default_cleanup_mins() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            inactivity_timeout: Duration::from_secs(default_inactivity_hours() * 3600),
            cleanup_interval: Duration::from_secs(default_cleanup_mins() * 60),
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HOST")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(default_host);
        let port = parse_or(&lookup, "PORT", default_port());
        let hours = parse_or(&lookup, "INACTIVITY_TIMEOUT_HOURS", default_inactivity_hours());
        let mins = parse_or(&lookup, "CLEANUP_INTERVAL_MINS", default_cleanup_mins()).max(1);
        let inactivity_timeout = secs_or(
            "INACTIVITY_TIMEOUT_HOURS",
            hours,
            3600,
            default_inactivity_hours(),
        );
        let cleanup_interval = secs_or("CLEANUP_INTERVAL_MINS", mins, 60, default_cleanup_mins());
        let max_conflict_retries =
            parse_or(&lookup, "MAX_CONFLICT_RETRIES", DEFAULT_MAX_CONFLICT_RETRIES);
        Self {
            host,
            port,
            inactivity_timeout,
            cleanup_interval,
            max_conflict_retries,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                log::warn!("Ignoring invalid {}={:?}, using default", key, raw);
                default
            }
        },
    }
}

/// `value * unit` seconds, or the default when the product does not fit in a `u64`.
fn secs_or(key: &str, value: u64, unit: u64, default: u64) -> Duration {
    match value.checked_mul(unit) {
        Some(secs) => Duration::from_secs(secs),
        None => {
            log::warn!("Ignoring out-of-range {}={}, using default", key, value);
            Duration::from_secs(default * unit)
        }
    }
}
