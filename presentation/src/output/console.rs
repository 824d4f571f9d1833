//! Console output formatter for engine reports

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use polyquorum_application::{EngineReport, MergeRecord};
use serde_json::json;

/// Formats engine reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format every merge with its contributions and the injected prompt
    pub fn format(report: &EngineReport) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Polyquorum Results"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n{} {}\n",
            "Cycles:".cyan().bold(),
            report.cycles,
            "Merges:".cyan().bold(),
            report.merges.len()
        ));

        if report.merges.is_empty() {
            output.push_str(&format!("\n{}\n", Self::no_merge_notice().yellow()));
        }

        for (index, merge) in report.merges.iter().enumerate() {
            output.push_str(&Self::section_header(&format!(
                "Merge {} into {}",
                index + 1,
                merge.sink.display_name()
            )));

            output.push_str(&format!(
                "{} {}\n",
                "Question:".cyan().bold(),
                merge.request.question
            ));

            for c in &merge.request.contributions {
                output.push_str(&format!(
                    "\n{}\n{}\n",
                    format!("── Window {}: {} ({}) ──", c.window, c.provider_name, c.slot.display_name())
                        .yellow()
                        .bold(),
                    Self::indent(&c.text, "  ")
                ));
            }

            output.push_str(&format!(
                "\n{} {}\n",
                "Sink submitted:".cyan().bold(),
                Self::submitted_label(merge)
            ));

            output.push_str(&format!("\n{}\n", "Synthesis request:".cyan().bold()));
            output.push_str(&Self::indent(&merge.request.render(), "  "));
            output.push('\n');
        }

        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(report: &EngineReport) -> String {
        let merges: Vec<_> = report
            .merges
            .iter()
            .map(|merge| {
                json!({
                    "sink": merge.sink,
                    "submitted": merge.submitted,
                    "question": merge.request.question,
                    "contributions": merge.request.contributions,
                    "prompt": merge.request.render(),
                })
            })
            .collect();

        let value = json!({
            "cycles": report.cycles,
            "merges": merges,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format the synthesis requests only (concise output)
    pub fn format_synthesis_only(report: &EngineReport) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== Polyquorum Synthesis ===".cyan().bold()
        ));

        if report.merges.is_empty() {
            output.push_str(Self::no_merge_notice());
            output.push('\n');
            return output;
        }

        for merge in &report.merges {
            output.push_str(&format!("{} {}\n", "Q:".bold(), merge.request.question));
            output.push_str(&format!(
                "{} {} -> {}\n\n",
                "Windows:".dimmed(),
                merge
                    .request
                    .contributions
                    .iter()
                    .map(|c| c.provider_name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                merge.sink.display_name()
            ));
            output.push_str(&merge.request.render());
            output.push_str("\n\n");
        }

        output
    }

    fn no_merge_notice() -> &'static str {
        "No synthesis request was produced."
    }

    fn submitted_label(merge: &MergeRecord) -> String {
        if merge.submitted {
            "yes".green().to_string()
        } else {
            "no".red().to_string()
        }
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
    fn format(&self, report: &EngineReport) -> String {
        Self::format(report)
    }

    fn format_json(&self, report: &EngineReport) -> String {
        Self::format_json(report)
    }

    fn format_synthesis_only(&self, report: &EngineReport) -> String {
        Self::format_synthesis_only(report)
    }
}
