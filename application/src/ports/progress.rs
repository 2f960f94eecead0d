//! Progress notification port
//!
//! Defines the interface for reporting progress during a review run.

use litreview_domain::{RevisionState, TaskId, TaskOutcome, TaskSpec};

/// Callback for progress updates during pipeline execution
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (progress bars, plain lines, etc.)
pub trait PipelineProgress: Send + Sync {
    /// Called once before the first task with the number of tasks
    fn on_pipeline_start(&self, _total_tasks: usize) {}

    /// Called when a task starts running
    fn on_task_start(&self, task: &TaskSpec);

    /// Called when a task reaches Succeeded or Failed
    fn on_task_complete(&self, task: &TaskSpec, outcome: &TaskOutcome);

    /// Called when a task is skipped without running
    fn on_task_skipped(&self, task_id: &TaskId, reason: &str);

    /// Called on every revision state change
    fn on_revision_state(&self, state: &RevisionState, cycle: u32);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl PipelineProgress for NoProgress {
    fn on_task_start(&self, _task: &TaskSpec) {}
    fn on_task_complete(&self, _task: &TaskSpec, _outcome: &TaskOutcome) {}
    fn on_task_skipped(&self, _task_id: &TaskId, _reason: &str) {}
    fn on_revision_state(&self, _state: &RevisionState, _cycle: u32) {}
}
