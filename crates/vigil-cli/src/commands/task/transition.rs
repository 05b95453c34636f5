use vigil_core::enums::TaskAction;
use vigil_core::responses::TransitionResponse;

use crate::cli::GlobalFlags;
use crate::commands::shared::parse::{parse_changes, parse_task_id};
use crate::context::AppContext;
use crate::output::output;

/// A status change requested from the command line, with its arguments.
pub enum Transition<'a> {
    Start { agent: Option<&'a str> },
    Propose { changes: &'a [String] },
    Approve,
    Reject { reason: Option<&'a str> },
    Complete { result: Option<&'a str> },
    Fail { error: Option<&'a str> },
}

impl Transition<'_> {
    const fn action(&self) -> TaskAction {
        match self {
            Self::Start { .. } => TaskAction::Start,
            Self::Propose { .. } => TaskAction::Propose,
            Self::Approve => TaskAction::Approve,
            Self::Reject { .. } => TaskAction::Reject,
            Self::Complete { .. } => TaskAction::Complete,
            Self::Fail { .. } => TaskAction::Fail,
        }
    }
}

/// Apply `transition` to task `id`. An unknown id or an illegal transition
/// is reported as `applied: false`, not as an error.
pub fn run(
    id: &str,
    transition: Transition<'_>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let id = parse_task_id(id)?;
    let action = transition.action();
    let queue = &ctx.queue;

    let applied = match transition {
        Transition::Start { agent } => queue.start(id, agent)?,
        Transition::Propose { changes } => queue.set_proposed_changes(id, parse_changes(changes)?)?,
        Transition::Approve => queue.approve(id)?,
        Transition::Reject { reason } => queue.reject(id, reason)?,
        Transition::Complete { result } => queue.complete(id, result)?,
        Transition::Fail { error } => queue.fail(id, error)?,
    };

    if !applied {
        tracing::warn!(task = %id, %action, "transition not applied");
    }

    output(
        &TransitionResponse {
            id: id.to_string(),
            action: action.to_string(),
            applied,
            task: queue.get(id),
        },
        flags.format,
    )
}
