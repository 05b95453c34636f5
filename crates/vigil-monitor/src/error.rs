use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    /// The queue can no longer be written; the loop must stop.
    #[error("Durability lost after {consecutive_failures} failing tick(s): {last_error}")]
    Durability {
        consecutive_failures: u32,
        last_error: String,
    },

    #[error("Monitor state I/O error on {}: {source}", path.display())]
    StateIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Monitor state serialization failed: {0}")]
    StateSerialize(#[from] serde_json::Error),
}
