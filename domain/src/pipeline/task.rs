//! Task definitions and status.

use super::output::OutputContract;
use crate::agent::role::RoleKind;
use crate::agent::tool::{ToolRef, ToolSet};
use serde::{Deserialize, Serialize};

/// Unique identifier for a task within a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<T: Into<String>> From<T> for TaskId {
    fn from(s: T) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a task within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is waiting to be executed
    #[default]
    Pending,
    /// Task is currently being executed
    Running,
    /// Task completed and its output satisfied the contract
    Succeeded,
    /// Task execution or decoding failed
    Failed,
    /// Task never ran (failed dependency or cancellation)
    Skipped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Skipped
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the crew carries out a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Render a prompt and hand it to the role's executor
    #[default]
    Prompt,
    /// Search the literature for the keywords in context and keep the
    /// papers the role judges relevant
    Retrieval,
}

/// A declared unit of work (immutable once the pipeline is built)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: TaskId,
    pub description: String,
    pub expected_output: OutputContract,
    pub role: RoleKind,
    /// Predecessor tasks whose results this task consumes, in order
    pub context: Vec<TaskId>,
    pub tool_overrides: Option<ToolSet>,
    pub kind: TaskKind,
    /// Stage name used when persisting this task's result
    pub artifact: Option<String>,
}

impl TaskSpec {
    pub fn new(id: impl Into<TaskId>, role: RoleKind, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            expected_output: OutputContract::Text,
            role,
            context: Vec::new(),
            tool_overrides: None,
            kind: TaskKind::Prompt,
            artifact: None,
        }
    }

    pub fn expecting(mut self, contract: OutputContract) -> Self {
        self.expected_output = contract;
        self
    }

    pub fn with_context(mut self, task_id: impl Into<TaskId>) -> Self {
        self.context.push(task_id.into());
        self
    }

    pub fn with_tool_override(mut self, tool: ToolRef) -> Self {
        self.tool_overrides
            .get_or_insert_with(ToolSet::new)
            .insert(tool);
        self
    }

    pub fn retrieval(mut self) -> Self {
        self.kind = TaskKind::Retrieval;
        self
    }

    pub fn with_artifact(mut self, stage: impl Into<String>) -> Self {
        self.artifact = Some(stage.into());
        self
    }
}
