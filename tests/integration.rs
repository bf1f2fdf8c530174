//! End-to-end runs of the engine over exported syntax bundles

use covenant::config::Config;
use covenant::diagnostic::Diagnostic;
use covenant::dispatcher::RuleRegistry;
use covenant::engine::{Engine, LintResult};
use covenant::facts::{FactsRepository, InMemoryFacts, Lookup};
use covenant::rule::{ConventionRule, RuleContext, RuleMeta};
use covenant::syntax::{NodeKind, SyntaxBundle, SyntaxNode};
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn facts() -> Arc<FactsRepository> {
    let facts = InMemoryFacts::load(&fixture("facts.json")).unwrap();
    Arc::new(FactsRepository::new(Arc::new(facts)))
}

fn lint(name: &str) -> LintResult {
    Engine::new(Config::new(), facts()).lint(&[fixture(name)])
}

/// (identifier, line) pairs, in report order
fn summary(result: &LintResult) -> Vec<(String, usize)> {
    result
        .diagnostics()
        .map(|d| (d.identifier.clone(), d.location.line))
        .collect()
}

#[test]
fn concrete_controller_test_must_extend_web_test_case() {
    let result = lint("scenario_a_concrete_test.json");

    assert_eq!(
        summary(&result),
        vec![("symfonyWebTest.controllerTestBase".to_string(), 11)]
    );
    let diag = result.diagnostics().next().unwrap();
    assert!(diag.message.contains("\"App\\Tests\\Controller\\UserControllerTest\""));
    assert!(diag.message.contains("current parent: PHPUnit\\Framework\\TestCase"));
    assert!(diag.tip.as_deref().unwrap().contains("AbstractWebTestCase"));
    assert_eq!(result.exit_code(), 2);
}

#[test]
fn controller_test_without_parent_or_facts() {
    let mut bundle = SyntaxBundle::load(&fixture("scenario_a_concrete_test.json")).unwrap();
    bundle.classes[0].extends = None;

    let result = Engine::new(Config::new(), Arc::new(FactsRepository::empty())).lint_bundle(&bundle);
    let messages: Vec<&str> = result.diagnostics().map(|d| d.message.as_str()).collect();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].ends_with("current parent: none."));
}

#[test]
fn abstract_controller_test_is_skipped() {
    let result = lint("scenario_b_abstract_test.json");
    assert!(result.is_clean(), "{:?}", summary(&result));
}

#[test]
fn helper_class_is_skipped() {
    let result = lint("scenario_c_helper.json");
    assert!(result.is_clean(), "{:?}", summary(&result));
}

#[test]
fn admin_action_with_route_reports_once() {
    let result = lint("scenario_d_action_with_route.json");

    assert_eq!(
        summary(&result),
        vec![("easyAdmin.forbidAdminActionWithRoute".to_string(), 34)]
    );
}

#[test]
fn flash_types_blocked_and_invalid() {
    let result = lint("scenario_e_flash.json");
    let diags: Vec<&Diagnostic> = result.diagnostics().collect();

    assert_eq!(diags.len(), 2);
    assert_eq!(diags[0].identifier, "easyAdmin.addFlashType");
    assert_eq!(diags[1].identifier, "easyAdmin.addFlashType");
    assert_eq!(
        diags[0].message,
        "Flash message type \"error\" is not allowed in EasyAdmin. Use \"danger\" instead."
    );
    assert_eq!(
        diags[1].message,
        "Invalid flash message type \"notice\". Allowed types: primary, secondary, success, danger, warning, info, light, dark"
    );
    assert_eq!((diags[0].location.line, diags[1].location.line), (12, 13));
}

#[test]
fn all_fixtures_in_one_parallel_run() {
    let files: Vec<PathBuf> = [
        "scenario_a_concrete_test.json",
        "scenario_b_abstract_test.json",
        "scenario_c_helper.json",
        "scenario_d_action_with_route.json",
        "scenario_e_flash.json",
    ]
    .iter()
    .map(|name| fixture(name))
    .collect();

    let mut config = Config::new();
    config.engine.jobs = 3;
    let result = Engine::new(config, facts()).lint(&files);

    assert_eq!(result.files_processed, 5);
    assert_eq!(result.error_count, 4);
    assert_eq!(result.files_with_errors, 3);
    assert_eq!(result.fault_count, 0);
    assert_eq!(result.files[3].file, files[3]);
}

#[test]
fn reflection_faults_yield_no_diagnostics_and_are_not_cached() {
    let repository = facts();
    let engine = Engine::new(Config::new(), Arc::clone(&repository));
    let result = engine.lint(&[fixture("broken_facts_test.json")]);

    assert!(result.is_clean(), "{:?}", summary(&result));
    assert_eq!(result.fault_count, 0);

    let broken = "App\\Tests\\Controller\\BrokenControllerTest";
    assert!(matches!(repository.lookup(broken), Lookup::Faulted));
    assert!(!repository.exists(broken));

    let before = repository.cache_stats().total_entries;
    repository.lookup(broken);
    assert_eq!(repository.cache_stats().total_entries, before);
}

struct PanickingRule {
    meta: RuleMeta,
}

impl ConventionRule for PanickingRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::ClassDeclaration
    }

    fn applies(&self, _node: &SyntaxNode<'_>, _ctx: &RuleContext<'_>) -> bool {
        true
    }

    fn evaluate(&self, _node: &SyntaxNode<'_>, _ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        panic!("facts table exploded")
    }
}

#[test]
fn panicking_rule_is_contained() {
    let mut registry = RuleRegistry::builtin();
    registry.register(Arc::new(PanickingRule {
        meta: RuleMeta::new("test.panics", "panics"),
    }));

    let engine = Engine::with_registry(Config::new(), facts(), registry);
    let result = engine.lint(&[fixture("scenario_e_flash.json")]);

    assert_eq!(result.fault_count, 1);
    let (_, fault) = result.faults().next().unwrap();
    assert_eq!(fault.rule_id, "test.panics");
    assert_eq!(fault.line, 8);
    assert!(fault.message.contains("facts table exploded"));

    assert_eq!(result.error_count, 2);
}

#[test]
fn config_selection_applies_to_fixtures() {
    let mut config = Config::new();
    config.add_ignore_prefixes(vec!["easyadmin".to_string()]);
    let result = Engine::new(config, facts()).lint(&[fixture("scenario_e_flash.json")]);
    assert!(result.is_clean());

    let mut config = Config::preset("minimal").unwrap();
    config.merge_cli(None, Some(1), None, None);
    let result = Engine::new(config, facts()).lint(&[fixture("scenario_d_action_with_route.json")]);
    assert!(result.is_clean(), "style rules are outside the minimal preset");
}
