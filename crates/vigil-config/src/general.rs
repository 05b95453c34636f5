//! General application configuration.

use serde::{Deserialize, Serialize};

fn default_repo_path() -> String {
    ".".to_string()
}

/// Default result limit.
const fn default_limit() -> u32 {
    20
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GeneralConfig {
    /// Repository watched for changes, relative to the project root.
    #[serde(default = "default_repo_path")]
    pub repo_path: String,

    /// Default result limit for list commands.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            repo_path: default_repo_path(),
            default_limit: default_limit(),
        }
    }
}
