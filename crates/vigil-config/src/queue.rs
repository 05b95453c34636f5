//! Queue persistence configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_queue_file() -> String {
    ".vigil/queue.json".to_string()
}

fn default_state_file() -> String {
    ".vigil/monitor-state.json".to_string()
}

const fn default_retry_max_attempts() -> u32 {
    4
}

const fn default_retry_base_delay_ms() -> u64 {
    100
}

const fn default_retry_max_delay_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct QueueConfig {
    /// Queue file, relative to the project root unless absolute.
    #[serde(default = "default_queue_file")]
    pub queue_file: String,

    /// Monitor state file (revision watermark + trigger timestamps).
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Attempts per store write, including the first one.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queue_file: default_queue_file(),
            state_file: default_state_file(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl QueueConfig {
    #[must_use]
    pub fn queue_path(&self, project_root: &Path) -> PathBuf {
        resolve(project_root, &self.queue_file)
    }

    #[must_use]
    pub fn state_path(&self, project_root: &Path) -> PathBuf {
        resolve(project_root, &self.state_file)
    }

    #[must_use]
    pub const fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    #[must_use]
    pub const fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }
}

fn resolve(root: &Path, configured: &str) -> PathBuf {
    let path = PathBuf::from(configured);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_against_project_root() {
        let config = QueueConfig::default();
        assert_eq!(
            config.queue_path(Path::new("/srv/app")),
            PathBuf::from("/srv/app/.vigil/queue.json")
        );
    }

    #[test]
    fn absolute_paths_are_kept() {
        let config = QueueConfig {
            queue_file: "/var/lib/vigil/queue.json".to_string(),
            ..QueueConfig::default()
        };
        assert_eq!(
            config.queue_path(Path::new("/srv/app")),
            PathBuf::from("/var/lib/vigil/queue.json")
        );
    }
}
