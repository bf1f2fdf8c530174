//! Single-pass rule dispatch
//!
//! The dispatcher walks a syntax bundle once and hands every node to the
//! rules registered for its kind, in registration order. A rule that panics
//! is contained: it contributes nothing for that node, the fault is recorded
//! in the outcome and logged, and every other rule keeps running.

use crate::config::ConventionsConfig;
use crate::diagnostic::Diagnostic;
use crate::facts::FactsRepository;
use crate::resolver::TestedClassNameResolver;
use crate::rule::{ConventionRule, RuleContext};
use crate::syntax::{NodeKind, SyntaxBundle};
use log::{debug, error};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-rule timing statistics
#[derive(Debug, Clone, Default)]
pub struct RuleTiming {
    pub rule_id: String,
    /// Total time spent in `applies` and `evaluate`
    pub total_time: Duration,
    /// Number of nodes the rule was evaluated on
    pub evaluation_count: usize,
    /// Number of diagnostics produced
    pub match_count: usize,
}

impl RuleTiming {
    pub fn new(rule_id: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            ..Default::default()
        }
    }

    /// Average time per evaluation
    pub fn avg_time(&self) -> Duration {
        if self.evaluation_count > 0 {
            self.total_time / self.evaluation_count as u32
        } else {
            Duration::ZERO
        }
    }

    pub fn absorb(&mut self, other: &RuleTiming) {
        self.total_time += other.total_time;
        self.evaluation_count += other.evaluation_count;
        self.match_count += other.match_count;
    }
}

/// A rule that panicked while inspecting a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFault {
    pub rule_id: String,
    pub line: usize,
    pub message: String,
}

/// Result of dispatching one bundle
#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub diagnostics: Vec<Diagnostic>,
    pub faults: Vec<RuleFault>,
    pub timings: HashMap<String, RuleTiming>,
}

/// Rules grouped by node kind, in registration order
#[derive(Default, Clone)]
pub struct RuleRegistry {
    by_kind: HashMap<NodeKind, Vec<Arc<dyn ConventionRule>>>,
    rules: Vec<Arc<dyn ConventionRule>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in rule
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for rule in crate::rules::builtin_rules() {
            registry.register(rule);
        }
        registry
    }

    pub fn register(&mut self, rule: Arc<dyn ConventionRule>) {
        self.by_kind
            .entry(rule.node_kind())
            .or_default()
            .push(Arc::clone(&rule));
        self.rules.push(rule);
    }

    /// Rules for a node kind
    pub fn for_kind(&self, kind: NodeKind) -> &[Arc<dyn ConventionRule>] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All rules in registration order
    pub fn rules(&self) -> &[Arc<dyn ConventionRule>] {
        &self.rules
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn ConventionRule>> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.rules.iter().map(|r| r.id()).collect();
        f.debug_struct("RuleRegistry").field("rules", &ids).finish()
    }
}

/// Shared collaborators for an analysis run
#[derive(Debug)]
pub struct AnalysisEnv {
    pub facts: Arc<FactsRepository>,
    pub resolver: TestedClassNameResolver,
    pub conventions: ConventionsConfig,
}

impl AnalysisEnv {
    pub fn new(facts: Arc<FactsRepository>, conventions: ConventionsConfig) -> Self {
        Self {
            facts,
            resolver: TestedClassNameResolver::new(&conventions.covers_attribute),
            conventions,
        }
    }
}

/// Routes nodes to rules
#[derive(Debug, Default)]
pub struct Dispatcher {
    registry: RuleRegistry,
}

impl Dispatcher {
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    /// Run every registered rule over the bundle
    pub fn run(&self, bundle: &SyntaxBundle, env: &AnalysisEnv) -> DispatchOutcome {
        self.run_filtered(bundle, env, |_| true)
    }

    /// Run the rules accepted by `keep` over the bundle
    pub fn run_filtered<F>(&self, bundle: &SyntaxBundle, env: &AnalysisEnv, keep: F) -> DispatchOutcome
    where
        F: Fn(&dyn ConventionRule) -> bool,
    {
        let mut outcome = DispatchOutcome::default();

        for (node, scope) in bundle.nodes() {
            let ctx = RuleContext {
                facts: &env.facts,
                names: &bundle.names,
                resolver: &env.resolver,
                conventions: &env.conventions,
                scope,
            };

            for rule in self.registry.for_kind(node.kind()) {
                if !keep(rule.as_ref()) {
                    continue;
                }

                let start = Instant::now();
                let result = catch_unwind(AssertUnwindSafe(|| {
                    if rule.applies(&node, &ctx) {
                        Some(rule.evaluate(&node, &ctx))
                    } else {
                        None
                    }
                }));
                let elapsed = start.elapsed();

                let timing = outcome
                    .timings
                    .entry(rule.id().to_string())
                    .or_insert_with(|| RuleTiming::new(rule.id()));
                timing.total_time += elapsed;

                match result {
                    Ok(Some(diagnostics)) => {
                        timing.evaluation_count += 1;
                        timing.match_count += diagnostics.len();
                        if !diagnostics.is_empty() {
                            debug!(
                                "{} reported {} diagnostic(s) at {}:{}",
                                rule.id(),
                                diagnostics.len(),
                                bundle.file.display(),
                                node.line()
                            );
                        }
                        outcome.diagnostics.extend(diagnostics);
                    }
                    Ok(None) => {}
                    Err(payload) => {
                        let fault = RuleFault {
                            rule_id: rule.id().to_string(),
                            line: node.line(),
                            message: panic_message(payload.as_ref()),
                        };
                        error!(
                            "Rule {} failed on {} node at {}:{}: {}",
                            fault.rule_id,
                            node.kind(),
                            bundle.file.display(),
                            fault.line,
                            fault.message
                        );
                        outcome.faults.push(fault);
                    }
                }
            }
        }

        outcome
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "rule panicked".to_string()
    }
}
