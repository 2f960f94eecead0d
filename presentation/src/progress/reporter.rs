//! Progress reporting for review runs

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use litreview_application::ports::progress::PipelineProgress;
use litreview_domain::{RevisionState, TaskId, TaskOutcome, TaskSpec, TaskStatus};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress with a pipeline bar and a revision spinner
pub struct ProgressReporter {
    multi: MultiProgress,
    pipeline_bar: Mutex<Option<ProgressBar>>,
    revision_spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            pipeline_bar: Mutex::new(None),
            revision_spinner: Mutex::new(None),
        }
    }

    fn pipeline_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.pipeline_bar.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pb) = guard.as_ref() {
            f(pb);
        }
    }

    fn finish_pipeline_if_done(&self) {
        let mut guard = self.pipeline_bar.lock().unwrap_or_else(|e| e.into_inner());
        let done = guard
            .as_ref()
            .is_some_and(|pb| pb.length().is_some_and(|len| pb.position() >= len));
        if done && let Some(pb) = guard.take() {
            pb.finish_with_message(format!("{}", "pipeline complete".green()));
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineProgress for ProgressReporter {
    fn on_pipeline_start(&self, total_tasks: usize) {
        let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
        pb.set_style(Self::pipeline_style());
        pb.set_prefix("Pipeline");
        pb.set_message("Starting...");
        pb.enable_steady_tick(Duration::from_millis(120));
        *self.pipeline_bar.lock().unwrap_or_else(|e| e.into_inner()) = Some(pb);
    }

    fn on_task_start(&self, task: &TaskSpec) {
        self.with_bar(|pb| pb.set_message(format!("{} ({})", task.id, task.role)));
    }

    fn on_task_complete(&self, task: &TaskSpec, outcome: &TaskOutcome) {
        self.with_bar(|pb| {
            let mark = if outcome.status == TaskStatus::Succeeded {
                "v".green()
            } else {
                "x".red()
            };
            pb.println(format!("  {} {}", mark, task.id));
            pb.inc(1);
        });
        self.finish_pipeline_if_done();
    }

    fn on_task_skipped(&self, task_id: &TaskId, reason: &str) {
        self.with_bar(|pb| {
            pb.println(format!("  {} {} ({})", "-".yellow(), task_id, reason.dimmed()));
            pb.inc(1);
        });
        self.finish_pipeline_if_done();
    }

    fn on_revision_state(&self, state: &RevisionState, cycle: u32) {
        let mut guard = self.revision_spinner.lock().unwrap_or_else(|e| e.into_inner());
        let spinner = guard.get_or_insert_with(|| {
            let sp = self.multi.add(ProgressBar::new_spinner());
            sp.set_style(Self::spinner_style());
            sp.set_prefix("Revision");
            sp.enable_steady_tick(Duration::from_millis(120));
            sp
        });

        if state.is_terminal() {
            let message = match state {
                RevisionState::FailedQuality => format!("{}", state.as_str().red()),
                _ => format!("{}", state.as_str().green()),
            };
            spinner.finish_with_message(format!("{} after {} cycle(s)", message, cycle));
            guard.take();
        } else {
            spinner.set_message(format!("cycle {}: {}", cycle, state.as_str()));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl PipelineProgress for SimpleProgress {
    fn on_pipeline_start(&self, total_tasks: usize) {
        println!("{} {} ({} tasks)", "->".cyan(), "Pipeline".bold(), total_tasks);
    }

    fn on_task_start(&self, task: &TaskSpec) {
        println!("  {} {} ({})", "..".dimmed(), task.id, task.role);
    }

    fn on_task_complete(&self, task: &TaskSpec, outcome: &TaskOutcome) {
        match outcome.status {
            TaskStatus::Succeeded => println!("  {} {}", "v".green(), task.id),
            _ => println!(
                "  {} {} (failed: {})",
                "x".red(),
                task.id,
                outcome.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    fn on_task_skipped(&self, task_id: &TaskId, reason: &str) {
        println!("  {} {} (skipped: {})", "-".yellow(), task_id, reason);
    }

    fn on_revision_state(&self, state: &RevisionState, cycle: u32) {
        println!("{} revision cycle {}: {}", "->".cyan(), cycle, state.as_str());
    }
}
