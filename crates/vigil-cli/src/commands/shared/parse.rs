use serde::de::DeserializeOwned;
use serde_json::Value;
use vigil_core::entities::Metadata;
use vigil_core::ids::TaskId;

/// Parse a snake_case enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.trim().to_ascii_lowercase().replace('-', "_");
    serde_json::from_value(Value::String(normalized))
        .map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

/// Parse a `Q-00001` task id.
pub fn parse_task_id(raw: &str) -> anyhow::Result<TaskId> {
    Ok(raw.trim().parse::<TaskId>()?)
}

/// Parse a `--metadata` argument, which must be a JSON object.
pub fn parse_metadata(raw: &str) -> anyhow::Result<Metadata> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => anyhow::bail!("metadata must be a JSON object"),
        Err(error) => anyhow::bail!("invalid metadata JSON: {error}"),
    }
}

/// Parse each `--change` argument as a JSON value.
pub fn parse_changes(raw: &[String]) -> anyhow::Result<Vec<Value>> {
    raw.iter()
        .enumerate()
        .map(|(index, change)| {
            serde_json::from_str(change)
                .map_err(|error| anyhow::anyhow!("invalid change #{}: {error}", index + 1))
        })
        .collect()
}
