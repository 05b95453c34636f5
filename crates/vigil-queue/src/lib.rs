//! # vigil-queue
//!
//! Durable task queue for Vigil.
//!
//! [`TaskQueue`] keeps an in-memory index of [`QueuedTask`](vigil_core::entities::QueuedTask)
//! records behind a single mutex and writes every accepted mutation through a
//! [`QueueStore`] before acknowledging it. The approval gate
//! (`set_proposed_changes` / `approve` / `reject`) lives on the same type.
//!
//! Two stores ship with the crate:
//!
//! - [`JsonFileStore`] persists the queue as one pretty-printed JSON document,
//!   replaced atomically on every save.
//! - [`MemoryStore`] keeps the snapshot in process and can be told to fail
//!   saves, which is how the durability paths are tested.

pub mod error;
pub mod queue;
pub mod retry;
pub mod store;

pub use error::{QueueError, StoreError};
pub use queue::TaskQueue;
pub use retry::RetryConfig;
pub use store::{
    JsonFileStore, MemoryStore, PersistedQueue, QueueSnapshot, QueueStore, write_atomic,
};
