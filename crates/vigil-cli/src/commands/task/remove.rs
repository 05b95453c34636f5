use serde::Serialize;
use vigil_core::responses::ClearCompletedResponse;

use crate::cli::GlobalFlags;
use crate::commands::shared::parse::parse_task_id;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct DeleteResponse {
    id: String,
    deleted: bool,
}

pub fn delete(id: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let id = parse_task_id(id)?;
    let deleted = ctx.queue.delete(id)?;
    output(
        &DeleteResponse {
            id: id.to_string(),
            deleted,
        },
        flags.format,
    )
}

pub fn clear_completed(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let removed = ctx.queue.clear_completed()?;
    output(&ClearCompletedResponse { removed }, flags.format)
}
