use serde::Serialize;
use serde_json::Value;
use vigil_core::entities::QueuedTask;

use crate::cli::OutputFormat;
use crate::ui;

pub mod table;

/// Render a serializable response to a string in the requested format.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Table => render_table(value),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

/// Print a task listing. Tables get one summary row per task; JSON keeps
/// every field.
pub fn output_tasks(tasks: &[QueuedTask], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Table {
        let rows: Vec<TaskRow<'_>> = tasks.iter().map(TaskRow::from).collect();
        return output(&rows, format);
    }
    output(&tasks, format)
}

#[derive(Serialize)]
struct TaskRow<'a> {
    id: String,
    status: &'static str,
    priority: &'static str,
    #[serde(rename = "type")]
    task_type: &'static str,
    title: &'a str,
    updated: String,
}

impl<'a> From<&'a QueuedTask> for TaskRow<'a> {
    fn from(task: &'a QueuedTask) -> Self {
        Self {
            id: task.id().to_string(),
            status: task.status().as_str(),
            priority: task.priority().as_str(),
            task_type: task.task_type().as_str(),
            title: task.title(),
            updated: task.updated_at().format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

fn table_options() -> table::TableOptions {
    let prefs = ui::prefs();
    table::TableOptions {
        max_width: prefs.term_width,
        color: prefs.table_color,
    }
}

fn render_table<T: Serialize>(value: &T) -> anyhow::Result<String> {
    match serde_json::to_value(value)? {
        Value::Array(items) => Ok(render_array_table(&items)),
        Value::Object(map) => {
            let rows = map
                .into_iter()
                .map(|(key, value)| vec![key, value_to_cell(&value)])
                .collect::<Vec<_>>();
            Ok(table::render_entity_table(
                &["key", "value"],
                &rows,
                table_options(),
            ))
        }
        scalar => Ok(value_to_cell(&scalar)),
    }
}

/// Columns are the union of keys across all rows.
fn render_array_table(items: &[Value]) -> String {
    if items.is_empty() {
        return String::from("(no rows)");
    }

    let mut headers = Vec::<String>::new();
    for map in items.iter().filter_map(Value::as_object) {
        for key in map.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    if headers.is_empty() {
        let rows = items
            .iter()
            .map(|item| vec![value_to_cell(item)])
            .collect::<Vec<_>>();
        return table::render_entity_table(&["value"], &rows, table_options());
    }

    let header_refs = headers.iter().map(String::as_str).collect::<Vec<_>>();
    let rows = items
        .iter()
        .map(|item| {
            headers
                .iter()
                .map(|header| {
                    item.get(header)
                        .map_or_else(|| String::from("-"), value_to_cell)
                })
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    table::render_entity_table(&header_refs, &rows, table_options())
}

fn value_to_cell(value: &Value) -> String {
    match value {
        Value::Null => String::from("-"),
        Value::Bool(v) => v.to_string(),
        Value::Number(v) => v.to_string(),
        Value::String(v) => v.clone(),
        other => other.to_string(),
    }
}
