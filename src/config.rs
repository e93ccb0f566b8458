//! Configuration Module
//!
//! Loads freshness windows, throttle spacing and storage settings from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

const HOUR: u64 = 3600;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite database file, or `:memory:`
    pub db_path: PathBuf,
    /// HTTP admin server port
    pub server_port: u16,
    /// Freshness window for market series, in hours
    pub cache_hours: u64,
    /// Freshness window for generated commentary, in hours
    pub commentary_cache_hours: u64,
    /// Entries older than this many hours are swept
    pub retention_hours: u64,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
    /// Minimum spacing between market-data calls, in milliseconds
    pub market_min_interval_ms: u64,
    /// Minimum spacing between text-generation calls, in milliseconds
    pub text_min_interval_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DB_PATH` - SQLite file (default: data/cache.db)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_HOURS` - Market series freshness (default: 1)
    /// - `COMMENTARY_CACHE_HOURS` - Commentary freshness (default: 24)
    /// - `RETENTION_HOURS` - Sweep horizon (default: 168)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 3600)
    /// - `MARKET_MIN_INTERVAL_MS` - Market-data throttle (default: 1000)
    /// - `TEXT_MIN_INTERVAL_MS` - Text-generation throttle (default: 2000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env::var("DB_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            server_port: parse_env("SERVER_PORT", defaults.server_port),
            cache_hours: parse_env("CACHE_HOURS", defaults.cache_hours),
            commentary_cache_hours: parse_env(
                "COMMENTARY_CACHE_HOURS",
                defaults.commentary_cache_hours,
            ),
            retention_hours: parse_env("RETENTION_HOURS", defaults.retention_hours),
            sweep_interval: parse_env("SWEEP_INTERVAL", defaults.sweep_interval),
            market_min_interval_ms: parse_env(
                "MARKET_MIN_INTERVAL_MS",
                defaults.market_min_interval_ms,
            ),
            text_min_interval_ms: parse_env("TEXT_MIN_INTERVAL_MS", defaults.text_min_interval_ms),
        }
    }

    pub fn market_freshness(&self) -> Duration {
        Duration::from_secs(self.cache_hours.saturating_mul(HOUR))
    }

    pub fn commentary_freshness(&self) -> Duration {
        Duration::from_secs(self.commentary_cache_hours.saturating_mul(HOUR))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours.saturating_mul(HOUR))
    }

    pub fn sweep_interval_duration(&self) -> Duration {
        Duration::from_secs(self.sweep_interval)
    }

    pub fn market_min_interval(&self) -> Duration {
        Duration::from_millis(self.market_min_interval_ms)
    }

    pub fn text_min_interval(&self) -> Duration {
        Duration::from_millis(self.text_min_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/cache.db"),
            server_port: 3000,
            cache_hours: 1,
            commentary_cache_hours: 24,
            retention_hours: 168,
            sweep_interval: 3600,
            market_min_interval_ms: 1000,
            text_min_interval_ms: 2000,
        }
    }
}

/// Unset or unparsable values fall back to `default`.
fn parse_env<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
