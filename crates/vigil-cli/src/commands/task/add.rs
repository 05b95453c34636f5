use vigil_core::entities::NewTask;
use vigil_core::enums::{TaskPriority, TaskType};

use crate::cli::GlobalFlags;
use crate::commands::shared::parse::{parse_enum, parse_metadata};
use crate::context::AppContext;
use crate::output::output;

pub struct AddArgs<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub task_type: Option<&'a str>,
    pub priority: Option<&'a str>,
    pub metadata: Option<&'a str>,
}

pub fn run(args: &AddArgs<'_>, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let input = build_task(args)?;
    let task = ctx.queue.add(input)?;
    output(&task, flags.format)
}

fn build_task(args: &AddArgs<'_>) -> anyhow::Result<NewTask> {
    if args.title.trim().is_empty() {
        anyhow::bail!("task title cannot be empty");
    }

    let mut task = NewTask::new(args.title, args.description);
    if let Some(raw) = args.task_type {
        task = task.task_type(parse_enum::<TaskType>(raw, "type")?);
    }
    if let Some(raw) = args.priority {
        task = task.priority(TaskPriority::parse(raw)?);
    }
    if let Some(raw) = args.metadata {
        task = task.metadata(parse_metadata(raw)?);
    }
    Ok(task)
}
