//! Entity structs for Vigil.
//!
//! All structs derive `Serialize`, `Deserialize`, and `JsonSchema` so the
//! persisted queue file can be round-tripped and validated.

mod new_task;
mod task;

pub use new_task::NewTask;
pub use task::{Metadata, QueuedTask};
