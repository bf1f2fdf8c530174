use crate::diagnostic::Diagnostic;
use crate::facts::Lookup;
use crate::names::short_name;
use crate::rule::{ConventionRule, RuleCategory, RuleContext, RuleMeta};
use crate::syntax::{NodeKind, SyntaxNode};

/// Tests of menu providers must build on the menu test case base
pub struct MenuProviderTestBaseRule {
    meta: RuleMeta,
}

impl Default for MenuProviderTestBaseRule {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuProviderTestBaseRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(
                "easyAdmin.menuProviderTest.mustInheritAbstractEasyAdminMenuTestCase",
                "menu-provider-test-base",
            )
            .with_category(RuleCategory::Correctness)
            .with_description("Tests covering a MenuProviderInterface must extend the menu test case"),
        }
    }
}

impl ConventionRule for MenuProviderTestBaseRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::ClassDeclaration
    }

    fn applies(&self, node: &SyntaxNode<'_>, _ctx: &RuleContext<'_>) -> bool {
        node.as_class().is_some_and(|class| {
            class.name.as_deref().is_some_and(|name| name.ends_with("Test"))
        })
    }

    fn evaluate(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let (Some(class), Some(class_name)) = (node.as_class(), ctx.class_name()) else {
            return Vec::new();
        };
        let conventions = ctx.conventions;

        let Some(covered) = ctx.covered_class(class) else {
            return Vec::new();
        };
        let Lookup::Found(covered_facts) = ctx.facts.lookup(&covered) else {
            return Vec::new();
        };
        if !covered_facts.implements(&conventions.menu_provider_interface) {
            return Vec::new();
        }

        if ctx.class_extends(&conventions.menu_test_case) != Some(false) {
            return Vec::new();
        }

        vec![self
            .meta
            .diagnostic(
                format!(
                    "Test class {} tests MenuProviderInterface implementation {} but does not extend {}.",
                    class_name, covered, conventions.menu_test_case
                ),
                class.line,
            )
            .with_tip(format!(
                "Extend {} to inherit the standard menu provider checks.",
                short_name(&conventions.menu_test_case)
            ))]
    }
}
