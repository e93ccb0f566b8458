//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;

/// Upper bound on an explicit sweep horizon (ten years).
const MAX_AGE_HOURS_LIMIT: u64 = 24 * 365 * 10;

/// Request body for POST /sweep
///
/// # Fields
/// - `max_age_hours`: Sweep horizon in hours (uses the configured retention if not specified)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SweepRequest {
    /// Optional horizon in hours
    #[serde(default)]
    pub max_age_hours: Option<u64>,
}

impl SweepRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match self.max_age_hours {
            Some(hours) if hours > MAX_AGE_HOURS_LIMIT => Some(format!(
                "max_age_hours exceeds maximum of {}",
                MAX_AGE_HOURS_LIMIT
            )),
            _ => None,
        }
    }

    /// The requested horizon, or `default` when none was given.
    pub fn max_age_or(&self, default: Duration) -> Duration {
        self.max_age_hours
            .map(|hours| Duration::from_secs(hours.saturating_mul(3600)))
            .unwrap_or(default)
    }
}
