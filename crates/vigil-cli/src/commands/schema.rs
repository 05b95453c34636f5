use vigil_queue::PersistedQueue;

use crate::cli::GlobalFlags;
use crate::output::output;

/// Handle `vigil schema`.
pub fn handle(flags: &GlobalFlags) -> anyhow::Result<()> {
    output(&PersistedQueue::schema(), flags.format)
}
