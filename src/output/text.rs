//! Human-readable text output formatter

use super::OutputFormatter;
use crate::diagnostic::{Diagnostic, Severity};
use crate::engine::LintResult;
use colored::*;
use std::path::Path;

/// One line per diagnostic, grouped by file
pub struct TextFormatter {
    pub colored: bool,

    /// Print remediation tips under each diagnostic
    pub show_tips: bool,

    pub show_stats: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            show_tips: true,
            show_stats: true,
        }
    }
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    fn paint(&self, text: String, style: fn(String) -> ColoredString) -> String {
        if self.colored {
            style(text).to_string()
        } else {
            text
        }
    }

    fn severity_str(&self, severity: Severity) -> String {
        let s = severity.to_string();
        if !self.colored {
            return s;
        }
        match severity {
            Severity::Error => s.red().bold().to_string(),
            Severity::Warning => s.yellow().bold().to_string(),
            Severity::Info => s.blue().to_string(),
        }
    }

    fn count(&self, n: usize, singular: &str, plural: &str, style: fn(String) -> ColoredString) -> String {
        let label = if n == 1 { singular } else { plural };
        self.paint(format!("{} {}", n, label), style)
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &LintResult) -> String {
        let mut output = String::new();

        for report in &result.files {
            if report.diagnostics.is_empty() && report.faults.is_empty() {
                continue;
            }

            let header = report.file.display().to_string();
            output.push_str(&self.paint(header, |s| s.underline()));
            output.push('\n');

            for diag in &report.diagnostics {
                output.push_str(&self.format_diagnostic(&report.file, diag));
            }
            for fault in &report.faults {
                output.push_str(&format!(
                    "{}:{}: {}[{}]: rule panicked: {}\n",
                    report.file.display(),
                    fault.line,
                    self.paint("fault".to_string(), |s| s.magenta().bold()),
                    fault.rule_id,
                    fault.message
                ));
            }
            output.push('\n');
        }

        if self.show_stats {
            output.push_str(&format!(
                "{} {} processed",
                result.files_processed,
                if result.files_processed == 1 { "file" } else { "files" }
            ));

            let mut counts = Vec::new();
            if result.error_count > 0 {
                counts.push(self.count(result.error_count, "error", "errors", |s| s.red()));
            }
            if result.warning_count > 0 {
                counts.push(self.count(result.warning_count, "warning", "warnings", |s| s.yellow()));
            }
            if result.info_count > 0 {
                counts.push(self.count(result.info_count, "info", "infos", |s| s.blue()));
            }
            if result.fault_count > 0 {
                counts.push(self.count(result.fault_count, "rule fault", "rule faults", |s| s.magenta()));
            }

            if !counts.is_empty() {
                output.push_str(&format!(": {}", counts.join(", ")));
            }
            output.push('\n');
            output.push_str(&format!("Finished in {:.2}s\n", result.duration.as_secs_f64()));
        }

        output
    }

    fn format_diagnostic(&self, file: &Path, diag: &Diagnostic) -> String {
        let location = match diag.location.column {
            Some(column) => format!("{}:{}:{}", file.display(), diag.location.line, column),
            None => format!("{}:{}", file.display(), diag.location.line),
        };

        let mut output = format!(
            "{}: {}[{}]: {}\n",
            location,
            self.severity_str(diag.severity),
            self.paint(diag.identifier.clone(), |s| s.cyan()),
            diag.message
        );

        if self.show_tips {
            if let Some(tip) = &diag.tip {
                let marker = self.paint("=".to_string(), |s| s.blue());
                let mut lines = tip.lines();
                if let Some(first) = lines.next() {
                    output.push_str(&format!("   {} tip: {}\n", marker, first));
                }
                for line in lines {
                    output.push_str(&format!("          {}\n", line));
                }
            }
        }

        output
    }
}
