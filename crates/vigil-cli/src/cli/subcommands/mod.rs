mod task;

pub use task::TaskCommands;
