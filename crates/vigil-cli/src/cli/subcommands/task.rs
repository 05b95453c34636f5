use clap::Subcommand;

/// Task queue commands.
#[derive(Clone, Debug, Subcommand)]
pub enum TaskCommands {
    /// Enqueue a task.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// code_review, security_scan, improvement, bug_fix, feature,
        /// documentation, monitoring
        #[arg(long = "type")]
        task_type: Option<String>,
        /// low, normal, high, critical (or 0-3)
        #[arg(long)]
        priority: Option<String>,
        /// JSON object stored with the task.
        #[arg(long)]
        metadata: Option<String>,
    },
    /// List tasks in creation order.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Pending tasks, highest priority first.
    Pending {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Tasks waiting for approval.
    Waiting {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Get a task by ID.
    Get { id: String },
    /// Mark a pending task in progress.
    Start {
        id: String,
        #[arg(long)]
        agent: Option<String>,
    },
    /// Attach proposed changes and send the task to approval.
    Propose {
        id: String,
        /// A JSON change descriptor; repeat for several.
        #[arg(long = "change", required = true)]
        changes: Vec<String>,
    },
    /// Approve a task waiting for approval.
    Approve { id: String },
    /// Reject a task waiting for approval.
    Reject {
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Mark a task completed.
    Complete {
        id: String,
        #[arg(long)]
        result: Option<String>,
    },
    /// Mark a task failed.
    Fail {
        id: String,
        #[arg(long)]
        error: Option<String>,
    },
    /// Delete a task.
    Delete { id: String },
    /// Remove all completed tasks.
    ClearCompleted,
}
