#[path = "task/add.rs"]
mod add;
#[path = "task/list.rs"]
mod list;
#[path = "task/remove.rs"]
mod remove;
#[path = "task/transition.rs"]
mod transition;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::TaskCommands;
use crate::commands::shared::parse::parse_task_id;
use crate::context::AppContext;
use crate::output::output;

use self::transition::Transition;

/// Handle `vigil task`.
pub fn handle(action: &TaskCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        TaskCommands::Add {
            title,
            description,
            task_type,
            priority,
            metadata,
        } => add::run(
            &add::AddArgs {
                title,
                description,
                task_type: task_type.as_deref(),
                priority: priority.as_deref(),
                metadata: metadata.as_deref(),
            },
            ctx,
            flags,
        ),
        TaskCommands::List { status, limit } => {
            list::list(status.as_deref(), *limit, ctx, flags)
        }
        TaskCommands::Pending { limit } => list::pending(*limit, ctx, flags),
        TaskCommands::Waiting { limit } => list::waiting(*limit, ctx, flags),
        TaskCommands::Get { id } => {
            let id = parse_task_id(id)?;
            let task = ctx
                .queue
                .get(id)
                .ok_or_else(|| anyhow::anyhow!("task {id} not found"))?;
            output(&task, flags.format)
        }
        TaskCommands::Start { id, agent } => transition::run(
            id,
            Transition::Start {
                agent: agent.as_deref(),
            },
            ctx,
            flags,
        ),
        TaskCommands::Propose { id, changes } => {
            transition::run(id, Transition::Propose { changes }, ctx, flags)
        }
        TaskCommands::Approve { id } => transition::run(id, Transition::Approve, ctx, flags),
        TaskCommands::Reject { id, reason } => transition::run(
            id,
            Transition::Reject {
                reason: reason.as_deref(),
            },
            ctx,
            flags,
        ),
        TaskCommands::Complete { id, result } => transition::run(
            id,
            Transition::Complete {
                result: result.as_deref(),
            },
            ctx,
            flags,
        ),
        TaskCommands::Fail { id, error } => transition::run(
            id,
            Transition::Fail {
                error: error.as_deref(),
            },
            ctx,
            flags,
        ),
        TaskCommands::Delete { id } => remove::delete(id, ctx, flags),
        TaskCommands::ClearCompleted => remove::clear_completed(ctx, flags),
    }
}
