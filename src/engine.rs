//! File-level engine
//!
//! Loads syntax bundles, applies the configuration (rule selection, per-file
//! ignores, severity overrides) and runs the dispatcher on each file,
//! in parallel when enabled.

use crate::config::Config;
use crate::diagnostic::{Diagnostic, Severity};
use crate::dispatcher::{AnalysisEnv, Dispatcher, RuleFault, RuleRegistry, RuleTiming};
use crate::facts::FactsRepository;
use crate::rule::ConventionRule;
use crate::syntax::SyntaxBundle;
use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Diagnostics and faults of one file
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileReport {
    pub file: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub faults: Vec<RuleFault>,
}

/// Result of linting operation
#[derive(Debug, Default)]
pub struct LintResult {
    /// Per-file reports, in input order
    pub files: Vec<FileReport>,

    pub files_processed: usize,

    pub files_with_errors: usize,

    pub files_with_warnings: usize,

    pub error_count: usize,

    pub warning_count: usize,

    pub info_count: usize,

    /// Rules that panicked
    pub fault_count: usize,

    /// Processing duration
    pub duration: Duration,

    /// Per-rule timing statistics (rule_id -> timing)
    pub rule_timings: HashMap<String, RuleTiming>,
}

impl LintResult {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warning_count > 0
    }

    /// Check if result is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        self.error_count == 0 && self.warning_count == 0
    }

    /// Get exit code (0 = success, 1 = warnings, 2 = errors)
    pub fn exit_code(&self) -> i32 {
        if self.error_count > 0 {
            2
        } else if self.warning_count > 0 {
            1
        } else {
            0
        }
    }

    /// All diagnostics across files
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.files.iter().flat_map(|f| f.diagnostics.iter())
    }

    /// All rule faults across files
    pub fn faults(&self) -> impl Iterator<Item = (&Path, &RuleFault)> {
        self.files
            .iter()
            .flat_map(|f| f.faults.iter().map(move |fault| (f.file.as_path(), fault)))
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: LintResult) {
        self.files.extend(other.files);
        self.files_processed += other.files_processed;
        self.files_with_errors += other.files_with_errors;
        self.files_with_warnings += other.files_with_warnings;
        self.error_count += other.error_count;
        self.warning_count += other.warning_count;
        self.info_count += other.info_count;
        self.fault_count += other.fault_count;

        for (rule_id, timing) in other.rule_timings {
            self.rule_timings
                .entry(rule_id)
                .or_insert_with(|| RuleTiming::new(&timing.rule_id))
                .absorb(&timing);
        }
    }

    /// Get rule timings sorted by total time (descending)
    pub fn sorted_timings(&self) -> Vec<&RuleTiming> {
        let mut timings: Vec<_> = self.rule_timings.values().collect();
        timings.sort_by(|a, b| b.total_time.cmp(&a.total_time));
        timings
    }

    fn from_report(report: FileReport, timings: HashMap<String, RuleTiming>) -> Self {
        let mut result = LintResult {
            files_processed: 1,
            fault_count: report.faults.len(),
            rule_timings: timings,
            ..LintResult::default()
        };

        for diag in &report.diagnostics {
            match diag.severity {
                Severity::Error => result.error_count += 1,
                Severity::Warning => result.warning_count += 1,
                Severity::Info => result.info_count += 1,
            }
        }
        if result.error_count > 0 {
            result.files_with_errors = 1;
        }
        if result.warning_count > 0 {
            result.files_with_warnings = 1;
        }

        result.files.push(report);
        result
    }
}

/// The convention engine
pub struct Engine {
    config: Config,
    dispatcher: Dispatcher,
    env: AnalysisEnv,
}

impl Engine {
    /// Engine with every built-in rule
    pub fn new(config: Config, facts: Arc<FactsRepository>) -> Self {
        Self::with_registry(config, facts, RuleRegistry::builtin())
    }

    pub fn with_registry(config: Config, facts: Arc<FactsRepository>, registry: RuleRegistry) -> Self {
        let env = AnalysisEnv::new(facts, config.conventions.clone());
        Self {
            config,
            dispatcher: Dispatcher::new(registry),
            env,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        self.dispatcher.registry()
    }

    /// Whether a rule is selected by the configuration
    pub fn is_rule_active(&self, rule: &dyn ConventionRule) -> bool {
        self.config.is_rule_enabled(rule.id()) && self.config.is_category_enabled(rule.meta().category)
    }

    /// Lint multiple bundle files
    pub fn lint(&self, files: &[PathBuf]) -> LintResult {
        let start = Instant::now();

        let results: Vec<LintResult> = if self.config.engine.parallel {
            let threads = if self.config.engine.jobs > 0 {
                self.config.engine.jobs
            } else {
                num_cpus::get()
            };

            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => pool.install(|| files.par_iter().map(|f| self.lint_file(f)).collect()),
                Err(e) => {
                    warn!("Failed to build thread pool ({}), using the global pool", e);
                    files.par_iter().map(|f| self.lint_file(f)).collect()
                }
            }
        } else {
            files.iter().map(|f| self.lint_file(f)).collect()
        };

        let mut combined = LintResult::default();
        for result in results {
            combined.merge(result);
        }

        combined.duration = start.elapsed();
        combined
    }

    /// Lint a single bundle file
    pub fn lint_file(&self, path: &Path) -> LintResult {
        match SyntaxBundle::load(path) {
            Ok(bundle) => self.lint_bundle(&bundle),
            Err(e) => {
                let report = FileReport {
                    file: path.to_path_buf(),
                    diagnostics: vec![Diagnostic::new(
                        "bundle-load-error",
                        format!("Failed to load syntax bundle: {}", e),
                        0,
                    )],
                    faults: Vec::new(),
                };
                LintResult::from_report(report, HashMap::new())
            }
        }
    }

    /// Lint an already loaded bundle
    pub fn lint_bundle(&self, bundle: &SyntaxBundle) -> LintResult {
        debug!("Linting {}", bundle.file.display());

        let outcome = self.dispatcher.run_filtered(bundle, &self.env, |rule| {
            self.is_rule_active(rule)
                && !self.config.should_ignore_rule_for_file(rule.id(), &bundle.file)
        });

        let diagnostics = outcome
            .diagnostics
            .into_iter()
            .map(|diag| match self.config.get_severity_override(&diag.identifier) {
                Some(severity) => diag.with_severity(severity),
                None => diag,
            })
            .collect();

        let report = FileReport {
            file: bundle.file.clone(),
            diagnostics,
            faults: outcome.faults,
        };
        LintResult::from_report(report, outcome.timings)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("registry", self.dispatcher.registry())
            .finish()
    }
}
