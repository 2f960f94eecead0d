//! Console output formatter for review reports

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use litreview_application::{RevisionOutcome, ReviewReport};
use litreview_domain::{RevisionState, RunStatus, TaskStatus};
use serde_json::Value;

/// Formats review reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format the complete report
    pub fn format(report: &ReviewReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Literature Review"));
        output.push('\n');
        output.push_str(&format!("{} {}\n", "Topic:".cyan().bold(), report.topic));
        output.push_str(&format!(
            "{} {}\n",
            "Status:".cyan().bold(),
            Self::status(report.status)
        ));

        output.push_str(&Self::section_header("Pipeline"));
        for outcome in report.run.outcomes() {
            let mark = match outcome.status {
                TaskStatus::Succeeded => "v".green(),
                TaskStatus::Failed => "x".red(),
                TaskStatus::Skipped => "-".yellow(),
                _ => "?".dimmed(),
            };
            let mut line = format!("  {} {} ({})", mark, outcome.task_id, outcome.role);
            if outcome.attempts > 1 {
                line.push_str(&format!(" [{} attempts]", outcome.attempts));
            }
            if let Some(error) = &outcome.error {
                line.push_str(&format!(": {}", error.dimmed()));
            }
            output.push_str(&line);
            output.push('\n');
        }

        if let Some(revision) = &report.revision {
            output.push_str(&Self::section_header("Revision"));
            output.push_str(&Self::revision(revision));
        }

        if let Some(review) = &report.final_review {
            output.push_str(&Self::section_header("Final Review"));
            output.push_str(&Self::final_review(review));
        }

        output.push_str(&Self::warnings(report));

        if let Some(draft) = &report.final_draft {
            output.push_str(&Self::section_header("Final Draft"));
            output.push('\n');
            output.push_str(draft);
            output.push('\n');
        }

        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(report: &ReviewReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
    }

    /// Verdict and draft only (concise output)
    pub fn format_summary(report: &ReviewReport) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== Literature Review ===".cyan().bold()
        ));
        output.push_str(&format!("{} {}\n", "Topic:".bold(), report.topic));

        let (succeeded, failed, skipped) = report.run.tally();
        output.push_str(&format!(
            "{} {} ({} succeeded, {} failed, {} skipped)\n",
            "Pipeline:".bold(),
            Self::status(report.status),
            succeeded,
            failed,
            skipped
        ));

        if let Some(revision) = &report.revision {
            output.push_str(&format!(
                "{} {} after {} cycle(s)\n",
                "Revision:".bold(),
                Self::revision_state(&revision.state),
                revision.cycles_completed()
            ));
            if let RevisionState::FinalAccepted { caveats } = &revision.state {
                for caveat in caveats {
                    output.push_str(&format!("  {} {}\n", "!".yellow(), caveat));
                }
            }
        }

        if let Some(readiness) = report
            .final_review
            .as_ref()
            .and_then(|r| r.pointer("/publication_readiness/status"))
            .and_then(Value::as_str)
        {
            output.push_str(&format!("{} {}\n", "Readiness:".bold(), readiness));
        }

        output.push_str(&Self::warnings(report));

        match &report.final_draft {
            Some(draft) => {
                output.push('\n');
                output.push_str(draft);
                output.push('\n');
            }
            None => output.push_str(&format!("\n{}\n", "No draft was produced.".red())),
        }

        output
    }

    fn status(status: RunStatus) -> String {
        match status {
            RunStatus::Succeeded => status.as_str().green().to_string(),
            RunStatus::Failed => status.as_str().red().to_string(),
            RunStatus::Cancelled => status.as_str().yellow().to_string(),
        }
    }

    fn revision_state(state: &RevisionState) -> String {
        match state {
            RevisionState::FinalAccepted { caveats } if caveats.is_empty() => {
                state.as_str().green().to_string()
            }
            RevisionState::FinalAccepted { .. } => {
                format!("{} (with caveats)", state.as_str()).yellow().to_string()
            }
            RevisionState::FailedQuality => state.as_str().red().to_string(),
            _ => state.as_str().yellow().to_string(),
        }
    }

    fn revision(revision: &RevisionOutcome) -> String {
        let mut output = format!(
            "\n{} {}\n",
            "State:".bold(),
            Self::revision_state(&revision.state)
        );
        if let Some(score) = revision
            .evaluation
            .as_ref()
            .and_then(|e| e.get("overall_score"))
        {
            output.push_str(&format!("{} {}\n", "Initial score:".bold(), score));
        }

        for cycle in &revision.cycles {
            output.push_str(&format!(
                "\n{}\n",
                format!("── Cycle {} ──", cycle.number).yellow().bold()
            ));
            output.push_str(&format!(
                "  {} suggestion(s), {} major\n",
                cycle.suggestions.len(),
                cycle.suggestions.major_count()
            ));
            if let Some(check) = &cycle.check {
                output.push_str(&format!(
                    "  addressed {}, pending {} ({} major)\n",
                    check.addressed.len(),
                    check.pending.len(),
                    check.pending_major()
                ));
                if !check.assessment.is_empty() {
                    output.push_str(&format!("{}\n", Self::indent(&check.assessment, "  ")));
                }
            }
        }

        if let RevisionState::FinalAccepted { caveats } = &revision.state
            && !caveats.is_empty()
        {
            output.push_str(&format!("\n{}\n", "Caveats:".yellow().bold()));
            for caveat in caveats {
                output.push_str(&format!("  * {}\n", caveat));
            }
        }

        if let Some(reason) = &revision.interrupted {
            output.push_str(&format!("\n{} {}\n", "Interrupted:".red().bold(), reason));
        }
        output
    }

    fn final_review(review: &Value) -> String {
        let mut output = String::new();

        if let Some(scores) = review.get("final_scores").and_then(Value::as_object) {
            output.push('\n');
            for (aspect, score) in scores {
                output.push_str(&format!("  {:<12} {}\n", aspect, score));
            }
        }

        if let Some(readiness) = review.get("publication_readiness") {
            if let Some(status) = readiness.get("status").and_then(Value::as_str) {
                output.push_str(&format!("\n{} {}\n", "Readiness:".cyan().bold(), status));
            }
            if let Some(comments) = readiness
                .get("additional_comments")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())
            {
                output.push_str(&format!("{}\n", Self::indent(comments, "  ")));
            }
        }

        for (key, title) in [
            ("major_contributions", "Contributions:"),
            ("limitations", "Limitations:"),
        ] {
            let items: Vec<&str> = review
                .pointer(&format!("/final_assessment/{}", key))
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            if !items.is_empty() {
                output.push_str(&format!("\n{}\n", title.cyan().bold()));
                for item in items {
                    output.push_str(&format!("  * {}\n", item));
                }
            }
        }
        output
    }

    fn warnings(report: &ReviewReport) -> String {
        if report.warnings.is_empty() {
            return String::new();
        }
        let mut output = format!("\n{}\n", "Warnings:".yellow().bold());
        for warning in &report.warnings {
            output.push_str(&format!("  * {}\n", warning));
        }
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_full(&self, report: &ReviewReport) -> String {
        Self::format(report)
    }

    fn format_summary(&self, report: &ReviewReport) -> String {
        Self::format_summary(report)
    }

    fn format_json(&self, report: &ReviewReport) -> String {
        Self::format_json(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use litreview_domain::{
        LiteratureReviewWorkflow, OutputFormat, PipelineRun, TaskOutcome, TaskOutput, Topic,
    };
    use serde_json::json;

    fn report() -> ReviewReport {
        let pipeline = LiteratureReviewWorkflow::new(Topic::parse("graph neural networks").unwrap())
            .build()
            .unwrap();
        let mut run = PipelineRun::new(&pipeline);
        let first = &pipeline.tasks()[0];
        run.record(TaskOutcome::succeeded(
            first.id.clone(),
            first.role,
            TaskOutput::Json(json!({"background": "b", "objectives": []})),
            1,
        ));
        run.cancel_remaining("pipeline cancelled");

        ReviewReport {
            topic: "graph neural networks".to_string(),
            status: run.status(),
            run,
            revision: None,
            final_draft: None,
            final_review: Some(json!({
                "final_scores": {"overall": 8},
                "publication_readiness": {"status": "publishable"}
            })),
            warnings: vec!["artifact write failed".to_string()],
        }
    }

    #[test]
    fn test_summary_mentions_status_and_readiness() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format_summary(&report());
        assert!(text.contains("Topic: graph neural networks"));
        assert!(text.contains("cancelled (1 succeeded, 0 failed, 6 skipped)"));
        assert!(text.contains("Readiness: publishable"));
        assert!(text.contains("artifact write failed"));
        assert!(text.contains("No draft was produced."));
    }

    #[test]
    fn test_full_lists_every_stage() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format(&report());
        assert!(text.contains("create_framework (professor)"));
        assert!(text.contains("integrate_review (postdoc): pipeline cancelled"));
        assert!(text.contains("overall"));
    }

    #[test]
    fn test_json_round_trips_through_serde() {
        let text = ConsoleFormatter.render(&report(), OutputFormat::Json);
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["topic"], "graph neural networks");
        assert_eq!(value["status"], "cancelled");
    }
}
