//! # vigil-monitor
//!
//! The background scheduler. Each [`Monitor::tick`] polls the change
//! detector, turns interesting changes into review tasks, fires the periodic
//! triggers that are due, and persists its watermark. [`Monitor::run`] repeats
//! that on a fixed interval until cancelled.

pub mod classifier;
pub mod error;
pub mod monitor;
pub mod state;
pub mod triggers;

pub use classifier::ChangeClassifier;
pub use error::MonitorError;
pub use monitor::{Monitor, TickReport};
pub use state::{MonitorState, MonitorStateStore, ReplayGuard};
pub use triggers::{PeriodicTrigger, SchedulerClock, TriggerStamps};
