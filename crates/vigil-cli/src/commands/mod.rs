pub mod dispatch;
pub mod run;
pub mod schema;
pub mod shared;
pub mod stats;
pub mod task;
