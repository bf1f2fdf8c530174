//! JSON output formatter

use super::OutputFormatter;
use crate::diagnostic::Diagnostic;
use crate::dispatcher::RuleFault;
use crate::engine::LintResult;
use serde::Serialize;
use std::path::Path;

/// Machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_default()
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    diagnostics: Vec<JsonDiagnostic<'a>>,
    faults: Vec<JsonFault<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    file: String,
    #[serde(flatten)]
    diagnostic: &'a Diagnostic,
}

#[derive(Serialize)]
struct JsonFault<'a> {
    file: String,
    #[serde(flatten)]
    fault: &'a RuleFault,
}

#[derive(Serialize)]
struct JsonSummary {
    files_processed: usize,
    files_with_errors: usize,
    files_with_warnings: usize,
    error_count: usize,
    warning_count: usize,
    info_count: usize,
    fault_count: usize,
    duration_ms: u128,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &LintResult) -> String {
        let diagnostics = result
            .files
            .iter()
            .flat_map(|report| {
                report.diagnostics.iter().map(|diagnostic| JsonDiagnostic {
                    file: report.file.display().to_string(),
                    diagnostic,
                })
            })
            .collect();

        let faults = result
            .faults()
            .map(|(file, fault)| JsonFault {
                file: file.display().to_string(),
                fault,
            })
            .collect();

        self.render(&JsonOutput {
            diagnostics,
            faults,
            summary: JsonSummary {
                files_processed: result.files_processed,
                files_with_errors: result.files_with_errors,
                files_with_warnings: result.files_with_warnings,
                error_count: result.error_count,
                warning_count: result.warning_count,
                info_count: result.info_count,
                fault_count: result.fault_count,
                duration_ms: result.duration.as_millis(),
            },
        })
    }

    fn format_diagnostic(&self, file: &Path, diagnostic: &Diagnostic) -> String {
        self.render(&JsonDiagnostic {
            file: file.display().to_string(),
            diagnostic,
        })
    }
}
