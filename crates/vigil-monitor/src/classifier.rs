//! Rules that turn a change delta into review tasks.

use serde_json::{Value, json};
use vigil_config::MonitorConfig;
use vigil_core::entities::{Metadata, NewTask};
use vigil_core::enums::{TaskPriority, TaskType};
use vigil_vcs::ChangeDelta;

pub const REVIEW_TITLE: &str = "Code review for new changes";
pub const SECURITY_TITLE: &str = "Security review for sensitive files";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeClassifier {
    /// Lowercased.
    sensitive_keywords: Vec<String>,
    review_threshold: usize,
    max_listed_paths: usize,
}

impl ChangeClassifier {
    #[must_use]
    pub fn new<I, S>(sensitive_keywords: I, review_threshold: usize, max_listed_paths: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            sensitive_keywords: sensitive_keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            review_threshold,
            max_listed_paths,
        }
    }

    #[must_use]
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            &config.sensitive_keywords,
            config.review_threshold,
            config.max_listed_paths,
        )
    }

    /// Whether `path` contains any sensitive keyword, ignoring case.
    #[must_use]
    pub fn is_sensitive(&self, path: &str) -> bool {
        let path = path.to_lowercase();
        self.sensitive_keywords.iter().any(|k| path.contains(k.as_str()))
    }

    /// Tasks to enqueue for `delta`: at most one review and one security task.
    #[must_use]
    pub fn classify(&self, delta: &ChangeDelta) -> Vec<NewTask> {
        if !delta.has_changes || delta.changed_paths.is_empty() {
            return Vec::new();
        }
        let commit = delta.new_marker.clone().map_or(Value::Null, Value::String);
        let mut tasks = Vec::new();

        let paths = &delta.changed_paths;
        if paths.len() > self.review_threshold {
            let all: Vec<&String> = paths.iter().collect();
            let listed = &all[..all.len().min(self.max_listed_paths)];
            let mut description = format!("{} files changed:\n", paths.len());
            for path in listed {
                description.push_str("- ");
                description.push_str(path);
                description.push('\n');
            }
            if paths.len() > listed.len() {
                description.push_str(&format!("... and {} more\n", paths.len() - listed.len()));
            }
            tasks.push(
                NewTask::new(REVIEW_TITLE, description.trim_end())
                    .task_type(TaskType::CodeReview)
                    .priority(TaskPriority::Normal)
                    .metadata(change_metadata(&commit, &all)),
            );
        }

        let sensitive: Vec<&String> = paths.iter().filter(|p| self.is_sensitive(p)).collect();
        if !sensitive.is_empty() {
            let description = format!(
                "Sensitive files changed: {}",
                sensitive
                    .iter()
                    .map(|p| p.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            tasks.push(
                NewTask::new(SECURITY_TITLE, description)
                    .task_type(TaskType::SecurityScan)
                    .priority(TaskPriority::High)
                    .metadata(change_metadata(&commit, &sensitive)),
            );
        }

        tasks
    }
}

fn change_metadata(commit: &Value, files: &[&String]) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("commit".to_string(), commit.clone());
    metadata.insert("files".to_string(), json!(files));
    metadata
}
