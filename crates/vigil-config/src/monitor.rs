//! Background monitor (scheduler) configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_tick_interval_secs() -> u64 {
    300
}

/// Six hours.
const fn default_security_scan_interval_secs() -> u64 {
    6 * 3600
}

/// Twelve hours.
const fn default_quality_check_interval_secs() -> u64 {
    12 * 3600
}

fn default_sensitive_keywords() -> Vec<String> {
    ["auth", "login", "password", "token", "secret", "api"]
        .into_iter()
        .map(String::from)
        .collect()
}

const fn default_review_threshold() -> usize {
    3
}

const fn default_max_listed_paths() -> usize {
    10
}

const fn default_max_consecutive_store_failures() -> u32 {
    3
}

const fn default_persist_state() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Seconds between monitor ticks.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Seconds between periodic security-scan tasks.
    #[serde(default = "default_security_scan_interval_secs")]
    pub security_scan_interval_secs: u64,

    /// Seconds between periodic quality-check tasks.
    #[serde(default = "default_quality_check_interval_secs")]
    pub quality_check_interval_secs: u64,

    /// Case-insensitive substrings marking a changed path as sensitive.
    /// An empty list disables the security-review classification.
    #[serde(default = "default_sensitive_keywords")]
    pub sensitive_keywords: Vec<String>,

    /// A review task is enqueued when more than this many paths changed.
    #[serde(default = "default_review_threshold")]
    pub review_threshold: usize,

    /// How many changed paths a review task description lists.
    #[serde(default = "default_max_listed_paths")]
    pub max_listed_paths: usize,

    /// Consecutive ticks with store failures after which the loop stops.
    #[serde(default = "default_max_consecutive_store_failures")]
    pub max_consecutive_store_failures: u32,

    /// Persist the revision watermark and trigger timestamps across restarts.
    #[serde(default = "default_persist_state")]
    pub persist_state: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            security_scan_interval_secs: default_security_scan_interval_secs(),
            quality_check_interval_secs: default_quality_check_interval_secs(),
            sensitive_keywords: default_sensitive_keywords(),
            review_threshold: default_review_threshold(),
            max_listed_paths: default_max_listed_paths(),
            max_consecutive_store_failures: default_max_consecutive_store_failures(),
            persist_state: default_persist_state(),
        }
    }
}

impl MonitorConfig {
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    #[must_use]
    pub const fn security_scan_interval(&self) -> Duration {
        Duration::from_secs(self.security_scan_interval_secs)
    }

    #[must_use]
    pub const fn quality_check_interval(&self) -> Duration {
        Duration::from_secs(self.quality_check_interval_secs)
    }

    /// Reject values the monitor cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for zero intervals or a zero
    /// store-failure budget.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("monitor.tick_interval_secs", self.tick_interval_secs),
            (
                "monitor.security_scan_interval_secs",
                self.security_scan_interval_secs,
            ),
            (
                "monitor.quality_check_interval_secs",
                self.quality_check_interval_secs,
            ),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if self.max_consecutive_store_failures == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.max_consecutive_store_failures".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = MonitorConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(300));
        assert_eq!(config.security_scan_interval(), Duration::from_secs(21_600));
        assert_eq!(config.quality_check_interval(), Duration::from_secs(43_200));
        assert_eq!(config.review_threshold, 3);
        assert_eq!(config.sensitive_keywords.len(), 6);
        assert!(config.persist_state);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = MonitorConfig {
            tick_interval_secs: 0,
            ..MonitorConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("monitor.tick_interval_secs"));
    }

    #[test]
    fn empty_keyword_list_is_allowed() {
        let config = MonitorConfig {
            sensitive_keywords: Vec::new(),
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
