use crate::diagnostic::Diagnostic;
use crate::facts::Lookup;
use crate::rule::{ConventionRule, RuleCategory, RuleContext, RuleMeta};
use crate::syntax::{NodeKind, SyntaxNode};

/// CRUD controllers must declare their route with `#[AdminCrud]`
pub struct RequireAdminCrudAttributeRule {
    meta: RuleMeta,
}

impl Default for RequireAdminCrudAttributeRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RequireAdminCrudAttributeRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(
                "symfonyWebTest.requireAdminCrudAttribute",
                "require-admin-crud-attribute",
            )
            .with_category(RuleCategory::Correctness)
            .with_description("Concrete CRUD controllers must carry #[AdminCrud]"),
        }
    }
}

impl ConventionRule for RequireAdminCrudAttributeRule {
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
        let (Some(class), Some(class_name)) = (node.as_class(), ctx.class_name()) else {
            return Vec::new();
        };
        let Lookup::Found(facts) = ctx.class_facts() else {
            return Vec::new();
        };

        let conventions = ctx.conventions;
        if !facts.is_subclass_of(&conventions.crud_controller)
            || class_name.ends_with("Test")
            || facts.is_abstract
        {
            return Vec::new();
        }

        let attribute = &conventions.admin_crud_attribute;
        let declared = facts.has_attribute(attribute)
            || class.attributes.iter().any(|attr| ctx.attribute_is(attr, attribute));
        if declared {
            return Vec::new();
        }

        vec![self
            .meta
            .diagnostic(
                format!(
                    "CRUD controller {} must declare its route with the #[AdminCrud] attribute",
                    class_name
                ),
                class.line,
            )
            .with_tip(
                "Add #[AdminCrud(routePath: \"/your-path\", routeName: \"your_route_name\")] to the class",
            )]
    }
}
