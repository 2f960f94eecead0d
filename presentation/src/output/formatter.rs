//! Output formatter trait

use litreview_application::ReviewReport;
use litreview_domain::OutputFormat;

/// Trait for formatting review reports
pub trait OutputFormatter {
    /// Every stage, the revision history, the final review and the draft
    fn format_full(&self, report: &ReviewReport) -> String;

    /// Status, verdict and the final draft
    fn format_summary(&self, report: &ReviewReport) -> String;

    /// The report as JSON
    fn format_json(&self, report: &ReviewReport) -> String;

    fn render(&self, report: &ReviewReport, format: OutputFormat) -> String {
        match format {
            OutputFormat::Full => self.format_full(report),
            OutputFormat::Summary => self.format_summary(report),
            OutputFormat::Json => self.format_json(report),
        }
    }
}
