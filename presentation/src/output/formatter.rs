//! Output formatter trait

use polyquorum_application::EngineReport;
use polyquorum_domain::OutputFormat;

/// Trait for formatting engine reports
pub trait OutputFormatter {
    /// Format every cycle and merge
    fn format(&self, report: &EngineReport) -> String;

    /// Format as JSON
    fn format_json(&self, report: &EngineReport) -> String;

    /// Format the synthesis requests only (concise output)
    fn format_synthesis_only(&self, report: &EngineReport) -> String;

    fn render(&self, format: OutputFormat, report: &EngineReport) -> String {
        match format {
            OutputFormat::Full => self.format(report),
            OutputFormat::Synthesis => self.format_synthesis_only(report),
            OutputFormat::Json => self.format_json(report),
        }
    }
}
