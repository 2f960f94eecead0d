//! PipelineRun: the record of one end-to-end execution.

use super::graph::Pipeline;
use super::output::TaskOutput;
use super::task::{TaskId, TaskStatus};
use crate::agent::role::RoleKind;
use serde::{Deserialize, Serialize};

/// Final state of a single task within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task_id: TaskId,
    pub role: RoleKind,
    pub status: TaskStatus,
    /// Decoded result; the contract's empty default when the task failed
    pub output: Option<TaskOutput>,
    pub error: Option<String>,
    /// Number of executor calls spent on this task
    pub attempts: u32,
}

impl TaskOutcome {
    pub fn pending(task_id: TaskId, role: RoleKind) -> Self {
        Self {
            task_id,
            role,
            status: TaskStatus::Pending,
            output: None,
            error: None,
            attempts: 0,
        }
    }

    pub fn succeeded(task_id: TaskId, role: RoleKind, output: TaskOutput, attempts: u32) -> Self {
        Self {
            task_id,
            role,
            status: TaskStatus::Succeeded,
            output: Some(output),
            error: None,
            attempts,
        }
    }

    pub fn failed(
        task_id: TaskId,
        role: RoleKind,
        fallback: TaskOutput,
        error: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            task_id,
            role,
            status: TaskStatus::Failed,
            output: Some(fallback),
            error: Some(error.into()),
            attempts,
        }
    }

    pub fn skipped(task_id: TaskId, role: RoleKind, reason: impl Into<String>) -> Self {
        Self {
            task_id,
            role,
            status: TaskStatus::Skipped,
            output: None,
            error: Some(reason.into()),
            attempts: 0,
        }
    }
}

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every terminal task succeeded
    Succeeded,
    /// At least one terminal task failed or was skipped
    Failed,
    /// The run was stopped before every task started
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
        }
    }
}

/// Results of one pipeline invocation, keyed by task id in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    outcomes: Vec<TaskOutcome>,
    terminal: Vec<TaskId>,
    cancelled: bool,
}

impl PipelineRun {
    /// Start a run with every task pending.
    pub fn new(pipeline: &Pipeline) -> Self {
        Self {
            outcomes: pipeline
                .tasks()
                .iter()
                .map(|t| TaskOutcome::pending(t.id.clone(), t.role))
                .collect(),
            terminal: pipeline
                .terminal_tasks()
                .into_iter()
                .map(|t| t.id.clone())
                .collect(),
            cancelled: false,
        }
    }

    /// Mark a task as running. Returns `false` for unknown ids.
    pub fn begin(&mut self, id: &TaskId) -> bool {
        match self.slot(id) {
            Some(outcome) => {
                outcome.status = TaskStatus::Running;
                true
            }
            None => false,
        }
    }

    /// Store an outcome, replacing any earlier one for the same task.
    pub fn record(&mut self, outcome: TaskOutcome) {
        if let Some(slot) = self.slot(&outcome.task_id) {
            *slot = outcome;
        }
    }

    /// Mark every task that has not started as skipped.
    pub fn cancel_remaining(&mut self, reason: &str) -> Vec<TaskId> {
        self.cancelled = true;
        let mut skipped = Vec::new();
        for outcome in &mut self.outcomes {
            if outcome.status == TaskStatus::Pending {
                outcome.status = TaskStatus::Skipped;
                outcome.error = Some(reason.to_string());
                skipped.push(outcome.task_id.clone());
            }
        }
        skipped
    }

    fn slot(&mut self, id: &TaskId) -> Option<&mut TaskOutcome> {
        self.outcomes.iter_mut().find(|o| &o.task_id == id)
    }

    pub fn get(&self, id: &TaskId) -> Option<&TaskOutcome> {
        self.outcomes.iter().find(|o| &o.task_id == id)
    }

    pub fn status_of(&self, id: &TaskId) -> Option<TaskStatus> {
        self.get(id).map(|o| o.status)
    }

    /// Output of a task that succeeded.
    pub fn output(&self, id: &TaskId) -> Option<&TaskOutput> {
        self.get(id)
            .filter(|o| o.status == TaskStatus::Succeeded)
            .and_then(|o| o.output.as_ref())
    }

    pub fn outcomes(&self) -> &[TaskOutcome] {
        &self.outcomes
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn status(&self) -> RunStatus {
        let all_terminal_succeeded = self
            .terminal
            .iter()
            .all(|id| self.status_of(id) == Some(TaskStatus::Succeeded));

        if all_terminal_succeeded {
            RunStatus::Succeeded
        } else if self.cancelled {
            RunStatus::Cancelled
        } else {
            RunStatus::Failed
        }
    }

    /// Count of outcomes per status: (succeeded, failed, skipped).
    pub fn tally(&self) -> (usize, usize, usize) {
        self.outcomes.iter().fold((0, 0, 0), |(s, f, k), o| match o.status {
            TaskStatus::Succeeded => (s + 1, f, k),
            TaskStatus::Failed => (s, f + 1, k),
            TaskStatus::Skipped => (s, f, k + 1),
            _ => (s, f, k),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::task::TaskSpec;

    fn pipeline() -> Pipeline {
        Pipeline::new(vec![
            TaskSpec::new("a", RoleKind::Professor, "first"),
            TaskSpec::new("b", RoleKind::Postdoc, "second").with_context("a"),
            TaskSpec::new("c", RoleKind::Phd, "independent"),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_run_is_all_pending() {
        let run = PipelineRun::new(&pipeline());
        assert_eq!(run.outcomes().len(), 3);
        assert!(run
            .outcomes()
            .iter()
            .all(|o| o.status == TaskStatus::Pending));
    }

    #[test]
    fn test_record_overwrites_instead_of_appending() {
        let mut run = PipelineRun::new(&pipeline());
        let id = TaskId::new("a");

        run.record(TaskOutcome::failed(
            id.clone(),
            RoleKind::Professor,
            TaskOutput::Text(String::new()),
            "first try",
            1,
        ));
        run.record(TaskOutcome::succeeded(
            id.clone(),
            RoleKind::Professor,
            TaskOutput::Text("ok".into()),
            2,
        ));

        assert_eq!(run.outcomes().len(), 3);
        assert_eq!(run.status_of(&id), Some(TaskStatus::Succeeded));
        assert_eq!(run.output(&id), Some(&TaskOutput::Text("ok".into())));
    }

    #[test]
    fn test_status_follows_terminal_tasks() {
        let mut run = PipelineRun::new(&pipeline());
        for (id, role) in [("a", RoleKind::Professor), ("c", RoleKind::Phd)] {
            run.record(TaskOutcome::succeeded(
                id.into(),
                role,
                TaskOutput::Text("x".into()),
                1,
            ));
        }
        assert_eq!(run.status(), RunStatus::Failed);

        run.record(TaskOutcome::succeeded(
            "b".into(),
            RoleKind::Postdoc,
            TaskOutput::Text("y".into()),
            1,
        ));
        assert_eq!(run.status(), RunStatus::Succeeded);
        assert_eq!(run.tally(), (3, 0, 0));
    }

    #[test]
    fn test_failed_output_not_exposed_as_result() {
        let mut run = PipelineRun::new(&pipeline());
        run.record(TaskOutcome::failed(
            "a".into(),
            RoleKind::Professor,
            TaskOutput::Text(String::new()),
            "boom",
            2,
        ));
        assert!(run.output(&"a".into()).is_none());
    }

    #[test]
    fn test_cancel_remaining_skips_pending_only() {
        let mut run = PipelineRun::new(&pipeline());
        run.record(TaskOutcome::succeeded(
            "a".into(),
            RoleKind::Professor,
            TaskOutput::Text("x".into()),
            1,
        ));

        let skipped = run.cancel_remaining("budget exhausted");
        assert_eq!(skipped, vec![TaskId::new("b"), TaskId::new("c")]);
        assert_eq!(run.status(), RunStatus::Cancelled);
        assert_eq!(run.tally(), (1, 0, 2));
    }
}
