//! # vigil-core
//!
//! Core types shared across all Vigil crates:
//! - The [`QueuedTask`](entities::QueuedTask) record and its builder input
//! - Status, priority and task-type enums, with the status transition table
//! - Sequential task ids (`Q-00001`)
//! - A [`Clock`](clock::Clock) seam so timestamps are deterministic in tests
//! - Cross-cutting error types
//! - Response types (queue statistics)

pub mod clock;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod responses;
