use clap::{Args, Subcommand};

use crate::cli::subcommands::TaskCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Run the background monitor until interrupted.
    Run(RunArgs),
    /// Work the task queue and its approval gate.
    Task {
        #[command(subcommand)]
        action: TaskCommands,
    },
    /// Task counts by status.
    Stats,
    /// Print the JSON schema of the queue file.
    Schema,
}

#[derive(Clone, Debug, Args)]
pub struct RunArgs {
    /// Run a single tick and print its report.
    #[arg(long)]
    pub once: bool,
}
