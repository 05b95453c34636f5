use std::path::{Path, PathBuf};
use std::sync::Arc;

use vigil_config::VigilConfig;
use vigil_core::clock::SystemClock;
use vigil_queue::{JsonFileStore, RetryConfig, TaskQueue};

/// Everything a command handler needs.
pub struct AppContext {
    pub project_root: PathBuf,
    pub config: VigilConfig,
    pub queue: Arc<TaskQueue>,
}

impl AppContext {
    pub fn init(project_root: PathBuf, config: VigilConfig) -> anyhow::Result<Self> {
        let store = JsonFileStore::new(config.queue.queue_path(&project_root))?;
        let retry = RetryConfig {
            max_attempts: config.queue.retry_max_attempts,
            base_delay: config.queue.retry_base_delay(),
            max_delay: config.queue.retry_max_delay(),
        };
        let queue = TaskQueue::open(Arc::new(store), Arc::new(SystemClock))?.with_retry(retry);

        Ok(Self {
            project_root,
            config,
            queue: Arc::new(queue),
        })
    }

    /// Repository watched by `vigil run`.
    pub fn repo_path(&self) -> PathBuf {
        let configured = Path::new(&self.config.general.repo_path);
        if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            self.project_root.join(configured)
        }
    }
}
