use vigil_core::enums::TaskStatus;

use crate::cli::GlobalFlags;
use crate::commands::shared::limit::{apply_limit, effective_limit};
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output_tasks;

/// `vigil task list`: creation order, optionally filtered by status.
pub fn list(
    status: Option<&str>,
    limit: Option<u32>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let mut tasks = match status {
        Some(raw) => ctx
            .queue
            .get_by_status(parse_enum::<TaskStatus>(raw, "status")?),
        None => ctx.queue.list(),
    };
    apply_limit(&mut tasks, effective_limit(limit, flags.limit, default_limit(ctx)));
    output_tasks(&tasks, flags.format)
}

/// `vigil task pending`: highest priority first.
pub fn pending(limit: Option<u32>, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut tasks = ctx.queue.get_pending();
    apply_limit(&mut tasks, effective_limit(limit, flags.limit, default_limit(ctx)));
    output_tasks(&tasks, flags.format)
}

/// `vigil task waiting`: the approval inbox.
pub fn waiting(limit: Option<u32>, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut tasks = ctx.queue.get_waiting_approval();
    apply_limit(&mut tasks, effective_limit(limit, flags.limit, default_limit(ctx)));
    output_tasks(&tasks, flags.format)
}

const fn default_limit(ctx: &AppContext) -> u32 {
    ctx.config.general.default_limit
}
