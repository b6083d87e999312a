//! Per-account floor configuration.
//!
//! Deserialized from the service's accounts file; every field has a
//! default so an account entry may be partial.

use serde::{Deserialize, Serialize};

use crate::error::FloorError;
use crate::validation::{ModelGroupLimits, RATE_MAX};

/// Upper bound on `max_schema_dims`.
pub const MAX_SCHEMA_DIMS_LIMIT: usize = 20;

/// Accepted fetch timeout range in milliseconds.
pub const FETCH_TIMEOUT_MS_RANGE: (u64, u64) = (10, 10_000);

/// Minimum refetch period in seconds.
pub const MIN_PERIOD_SEC: u64 = 300;

/// Minimum cache TTL for fetched documents in seconds.
pub const MIN_MAX_AGE_SEC: u64 = 600;

/// Dynamic-fetch settings for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountFetchConfig {
    pub enabled: bool,
    pub url: String,
    pub timeout_ms: u64,
    pub max_file_size_kb: u64,
    pub max_rules: usize,
    /// Default cache TTL for fetched documents.
    pub max_age_sec: u64,
    /// Refetch cadence.
    pub period_sec: u64,
    pub account_id: String,
}

impl Default for AccountFetchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            timeout_ms: 3000,
            max_file_size_kb: 100,
            max_rules: 1000,
            max_age_sec: 86_400,
            period_sec: 3600,
            account_id: String::new(),
        }
    }
}

/// Floor settings for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountFloorConfig {
    pub enabled: bool,
    /// Percentage of requests on which floors are enforced.
    pub enforce_floors_rate: i32,
    pub enforce_deal_floors: bool,
    pub use_dynamic_data: bool,
    /// Per-model-group rule limit for request-level documents.
    pub max_rules: usize,
    pub max_schema_dims: usize,
    pub fetch: AccountFetchConfig,
}

impl Default for AccountFloorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enforce_floors_rate: 100,
            enforce_deal_floors: false,
            use_dynamic_data: false,
            max_rules: 100,
            max_schema_dims: 3,
            fetch: AccountFetchConfig::default(),
        }
    }
}

impl AccountFloorConfig {
    /// Limits applied when filtering model groups.
    pub fn limits(&self) -> ModelGroupLimits {
        ModelGroupLimits {
            max_schema_dims: self.max_schema_dims,
            max_rules: self.max_rules,
        }
    }

    /// Range-check the configuration.
    pub fn validate(&self) -> Result<(), FloorError> {
        let invalid = |msg: String| Err(FloorError::InvalidConfig(msg));

        if !(0..=RATE_MAX).contains(&self.enforce_floors_rate) {
            return invalid(format!(
                "enforce_floors_rate should be between 0 and 100, got {}",
                self.enforce_floors_rate
            ));
        }
        if self.max_schema_dims > MAX_SCHEMA_DIMS_LIMIT {
            return invalid(format!(
                "max_schema_dims should be between 0 and {MAX_SCHEMA_DIMS_LIMIT}, got {}",
                self.max_schema_dims
            ));
        }

        let fetch = &self.fetch;
        let (min_timeout, max_timeout) = FETCH_TIMEOUT_MS_RANGE;
        if !(min_timeout..=max_timeout).contains(&fetch.timeout_ms) {
            return invalid(format!(
                "fetch.timeout_ms should be between {min_timeout} and {max_timeout}, got {}",
                fetch.timeout_ms
            ));
        }
        if fetch.period_sec < MIN_PERIOD_SEC {
            return invalid(format!(
                "fetch.period_sec should not be less than {MIN_PERIOD_SEC}, got {}",
                fetch.period_sec
            ));
        }
        if fetch.max_age_sec < MIN_MAX_AGE_SEC {
            return invalid(format!(
                "fetch.max_age_sec should not be less than {MIN_MAX_AGE_SEC}, got {}",
                fetch.max_age_sec
            ));
        }
        if fetch.max_age_sec < fetch.period_sec {
            return invalid(format!(
                "fetch.max_age_sec ({}) should not be less than fetch.period_sec ({})",
                fetch.max_age_sec, fetch.period_sec
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AccountFloorConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: AccountFloorConfig = serde_json::from_value(serde_json::json!({
            "use_dynamic_data": true,
            "fetch": {"enabled": true, "url": "https://floors.example.com/a.json"}
        }))
        .unwrap();

        assert!(config.enabled);
        assert!(config.use_dynamic_data);
        assert_eq!(config.max_schema_dims, 3);
        assert_eq!(config.fetch.period_sec, 3600);
        assert_eq!(config.fetch.url, "https://floors.example.com/a.json");
    }

    #[test]
    fn out_of_range_values_rejected() {
        let mut config = AccountFloorConfig::default();
        config.enforce_floors_rate = 101;
        assert!(config.validate().is_err());

        let mut config = AccountFloorConfig::default();
        config.fetch.timeout_ms = 5;
        assert!(config.validate().is_err());

        let mut config = AccountFloorConfig::default();
        config.fetch.period_sec = 100;
        assert!(config.validate().is_err());

        let mut config = AccountFloorConfig::default();
        config.fetch.max_age_sec = 1000;
        config.fetch.period_sec = 2000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn limits_mirror_config() {
        let limits = AccountFloorConfig::default().limits();
        assert_eq!(limits.max_schema_dims, 3);
        assert_eq!(limits.max_rules, 100);
    }
}
