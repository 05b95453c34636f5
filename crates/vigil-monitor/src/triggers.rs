//! Fixed-interval triggers.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use vigil_config::MonitorConfig;
use vigil_core::entities::{Metadata, NewTask};
use vigil_core::enums::{TaskPriority, TaskType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodicTrigger {
    SecurityScan,
    QualityCheck,
}

impl PeriodicTrigger {
    pub const ALL: [Self; 2] = [Self::SecurityScan, Self::QualityCheck];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SecurityScan => "security_scan",
            Self::QualityCheck => "quality_check",
        }
    }

    /// The task this trigger enqueues when it fires at `now`.
    #[must_use]
    pub fn task(self, now: DateTime<Utc>) -> NewTask {
        let (title, description, task_type, priority) = match self {
            Self::SecurityScan => (
                "Periodic security scan",
                "Scheduled security review of the whole repository.",
                TaskType::SecurityScan,
                TaskPriority::Normal,
            ),
            Self::QualityCheck => (
                "Periodic code quality check",
                "Scheduled review of code quality and maintainability.",
                TaskType::CodeReview,
                TaskPriority::Low,
            ),
        };
        let mut metadata = Metadata::new();
        metadata.insert("type".to_string(), json!("periodic"));
        metadata.insert("trigger".to_string(), json!(self.as_str()));
        metadata.insert("triggered_at".to_string(), json!(now.to_rfc3339()));

        NewTask::new(title, description)
            .task_type(task_type)
            .priority(priority)
            .metadata(metadata)
    }
}

impl fmt::Display for PeriodicTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When each trigger last fired. Persisted with the monitor state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerStamps {
    #[serde(default)]
    pub last_security_scan: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_quality_check: Option<DateTime<Utc>>,
}

/// Due-checks for the periodic triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerClock {
    stamps: TriggerStamps,
    security_scan_interval: TimeDelta,
    quality_check_interval: TimeDelta,
}

impl SchedulerClock {
    #[must_use]
    pub fn new(security_scan_interval: Duration, quality_check_interval: Duration) -> Self {
        Self {
            stamps: TriggerStamps::default(),
            security_scan_interval: to_delta(security_scan_interval),
            quality_check_interval: to_delta(quality_check_interval),
        }
    }

    #[must_use]
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            config.security_scan_interval(),
            config.quality_check_interval(),
        )
    }

    #[must_use]
    pub fn with_stamps(mut self, stamps: TriggerStamps) -> Self {
        self.stamps = stamps;
        self
    }

    #[must_use]
    pub const fn stamps(&self) -> &TriggerStamps {
        &self.stamps
    }

    #[must_use]
    pub const fn last_fired(&self, trigger: PeriodicTrigger) -> Option<DateTime<Utc>> {
        match trigger {
            PeriodicTrigger::SecurityScan => self.stamps.last_security_scan,
            PeriodicTrigger::QualityCheck => self.stamps.last_quality_check,
        }
    }

    #[must_use]
    pub const fn interval(&self, trigger: PeriodicTrigger) -> TimeDelta {
        match trigger {
            PeriodicTrigger::SecurityScan => self.security_scan_interval,
            PeriodicTrigger::QualityCheck => self.quality_check_interval,
        }
    }

    /// Never fired, or at least one interval has passed since it did.
    #[must_use]
    pub fn is_due(&self, trigger: PeriodicTrigger, now: DateTime<Utc>) -> bool {
        self.last_fired(trigger)
            .is_none_or(|last| now - last >= self.interval(trigger))
    }

    /// Record a successful firing. Call only after the task was enqueued.
    pub fn mark_fired(&mut self, trigger: PeriodicTrigger, now: DateTime<Utc>) {
        match trigger {
            PeriodicTrigger::SecurityScan => self.stamps.last_security_scan = Some(now),
            PeriodicTrigger::QualityCheck => self.stamps.last_quality_check = Some(now),
        }
    }
}

fn to_delta(interval: Duration) -> TimeDelta {
    TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX)
}
