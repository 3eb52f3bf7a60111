//! The task manifest produced by planning.

use derive_getters::Getters;
use serde::{Deserialize, Deserializer, Serialize};

/// Creative stage a task belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Brainstorm premises and hooks
    #[display("inspiration")]
    Inspiration,
    /// Build the world
    #[display("worldview")]
    Worldview,
    /// Create the cast
    #[display("character")]
    Character,
    /// Sketch the overall plot
    #[display("plot_outline")]
    PlotOutline,
    /// Produce the chapter outline
    #[display("outline")]
    Outline,
    /// Write chapters
    #[display("chapter")]
    Chapter,
}

/// Progress marker carried on a task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    #[default]
    #[display("pending")]
    Pending,
    /// Running
    #[display("in_progress")]
    InProgress,
    /// Finished
    #[display("completed")]
    Completed,
    /// Failed
    #[display("failed")]
    Failed,
}

/// One step of a manifest.
///
/// Tasks are never edited in place; edits replace the whole manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct Task {
    /// Task identifier (models sometimes emit numbers; they are stringified)
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    /// Creative stage
    #[serde(rename = "type")]
    task_type: TaskType,
    /// Short title
    title: String,
    /// Instructions, possibly carrying action tags
    #[serde(default)]
    description: String,
    /// Progress marker
    #[serde(default)]
    status: TaskStatus,
}

impl Task {
    /// Creates a pending task.
    pub fn new(
        id: impl Into<String>,
        task_type: TaskType,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            task_type,
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Pending,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "task id must be a string or number, got {}",
            other
        ))),
    }
}

/// The full ordered pipeline of tasks.
///
/// # Examples
///
/// ```
/// use scrivener_automation::{Manifest, Task, TaskType};
///
/// let manifest = Manifest::new(vec![Task::new("1", TaskType::Worldview, "World", "")]);
/// assert_eq!(manifest.len(), 1);
/// assert_eq!(*manifest.current_task_index(), 0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Tasks in execution order
    tasks: Vec<Task>,
    /// Index of the task to run next
    #[serde(default)]
    current_task_index: usize,
}

impl Manifest {
    /// Creates a manifest positioned at its first task.
    pub fn new(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            current_task_index: 0,
        }
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether there are no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Task at an index.
    pub fn task(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }
}
