use crate::diagnostic::Diagnostic;
use crate::heuristics::{configured_filters, is_search_test_name};
use crate::rule::{ConventionRule, RuleCategory, RuleContext, RuleMeta};
use crate::rules::{crud_controller_under_test, test_methods};
use crate::syntax::{NodeKind, SyntaxNode};

/// Filters listed in the message before truncating
const LISTED_FILTERS: usize = 3;

pub struct FilterTestCoverageRule {
    meta: RuleMeta,
}

impl Default for FilterTestCoverageRule {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterTestCoverageRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(
                "symfonyWebTest.easyAdminFilterTestCoverage",
                "easyadmin-filter-test-coverage",
            )
            .with_category(RuleCategory::Coverage)
            .with_description("A CRUD controller with filters needs a search test"),
        }
    }
}

impl ConventionRule for FilterTestCoverageRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::ClassDeclaration
    }

    fn applies(&self, node: &SyntaxNode<'_>, _ctx: &RuleContext<'_>) -> bool {
        node.as_class()
            .is_some_and(|class| !class.is_abstract && class.name.is_some())
    }

    fn evaluate(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Some(class) = node.as_class() else {
            return Vec::new();
        };
        let Some(controller) =
            crud_controller_under_test(ctx, class, &ctx.conventions.controller_test_case)
        else {
            return Vec::new();
        };

        let filters = controller
            .method("configureFilters")
            .and_then(|m| m.source.as_deref())
            .map(configured_filters)
            .unwrap_or_default();
        if filters.is_empty() {
            return Vec::new();
        }

        if test_methods(ctx, class).iter().any(|t| is_search_test_name(&t.name)) {
            return Vec::new();
        }

        let mut listed = filters
            .iter()
            .take(LISTED_FILTERS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        if filters.len() > LISTED_FILTERS {
            listed.push_str("...");
        }

        vec![self
            .meta
            .diagnostic(
                format!(
                    "Controller configures {} filter(s) ({}) but has no search test",
                    filters.len(),
                    listed
                ),
                class.line,
            )
            .with_tip(
                "Add a testSearchAndFilter() method that requests the index page with filters[field]=value query parameters and asserts the filtered rows",
            )]
    }
}
