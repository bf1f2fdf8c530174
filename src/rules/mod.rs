//! Built-in convention rules

pub mod controller;
pub mod controller_test_base;
pub mod easyadmin;
pub mod invoke_response;
pub mod separate_process;

pub use controller::{is_controller_class, ControllerSignal};
pub use controller_test_base::ControllerTestBaseRule;
pub use easyadmin::{
    AddFlashTypeRule, AdminActionRouteParametersRule, BatchActionTestRule,
    CustomActionTestCoverageRule, FilterTestCoverageRule, ForbidAdminActionWithRouteRule,
    MenuProviderTestBaseRule, RequireAdminCrudAttributeRule, RequiredFieldValidationTestRule,
};
pub use invoke_response::InvokeResponseRule;
pub use separate_process::RequireRunInSeparateProcessRule;

use crate::facts::{ClassFacts, Lookup};
use crate::rule::{ConventionRule, RuleContext};
use crate::syntax::ClassDeclaration;
use std::sync::Arc;

/// Every built-in rule, in registration order
pub fn builtin_rules() -> Vec<Arc<dyn ConventionRule>> {
    vec![
        Arc::new(ControllerTestBaseRule::new()),
        Arc::new(RequireRunInSeparateProcessRule::new()),
        Arc::new(InvokeResponseRule::new()),
        Arc::new(RequireAdminCrudAttributeRule::new()),
        Arc::new(AdminActionRouteParametersRule::new()),
        Arc::new(ForbidAdminActionWithRouteRule::new()),
        Arc::new(AddFlashTypeRule::new()),
        Arc::new(CustomActionTestCoverageRule::new()),
        Arc::new(FilterTestCoverageRule::new()),
        Arc::new(BatchActionTestRule::new()),
        Arc::new(RequiredFieldValidationTestRule::new()),
        Arc::new(MenuProviderTestBaseRule::new()),
    ]
}

/// A method of the class under analysis, with its body when known
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TestMethod {
    pub name: String,
    pub source: Option<String>,
}

/// Methods of the enclosing test class.
///
/// Reflection facts include inherited methods and body excerpts; without
/// facts only the methods declared in the file are known.
pub(crate) fn test_methods(ctx: &RuleContext<'_>, class: &ClassDeclaration) -> Vec<TestMethod> {
    match ctx.class_facts() {
        Lookup::Found(facts) => facts
            .methods
            .iter()
            .map(|m| TestMethod {
                name: m.name.clone(),
                source: m.source.clone(),
            })
            .collect(),
        _ => class
            .methods
            .iter()
            .map(|m| TestMethod {
                name: m.name.clone(),
                source: None,
            })
            .collect(),
    }
}

/// The CRUD controller a test class covers, when the class extends `base`
pub(crate) fn crud_controller_under_test(
    ctx: &RuleContext<'_>,
    class: &ClassDeclaration,
    base: &str,
) -> Option<Arc<ClassFacts>> {
    if ctx.class_extends(base) != Some(true) {
        return None;
    }

    let covered = ctx.covered_class(class)?;
    ctx.facts
        .get(&covered)
        .filter(|facts| facts.is_subclass_of(&ctx.conventions.crud_controller))
}
