use crate::diagnostic::Diagnostic;
use crate::rule::{ConventionRule, RuleCategory, RuleContext, RuleMeta};
use crate::syntax::{NodeKind, SyntaxNode};

pub struct ForbidAdminActionWithRouteRule {
    meta: RuleMeta,
}

impl Default for ForbidAdminActionWithRouteRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ForbidAdminActionWithRouteRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(
                "easyAdmin.forbidAdminActionWithRoute",
                "forbid-admin-action-with-route",
            )
            .with_category(RuleCategory::Style)
            .with_description("A method must not carry both #[AdminAction] and #[Route]")
            .with_rationale("EasyAdmin generates the route for admin actions; a second #[Route] registers a conflicting one.")
            .with_example_bad("#[AdminAction(routePath: 'approve', routeName: 'approve')]\n#[Route('/approve')]\npublic function approve(): Response"),
        }
    }
}

impl ConventionRule for ForbidAdminActionWithRouteRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::MethodDeclaration
    }

    fn applies(&self, node: &SyntaxNode<'_>, _ctx: &RuleContext<'_>) -> bool {
        node.as_method().is_some_and(|method| method.attributes.len() >= 2)
    }

    fn evaluate(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Some(method) = node.as_method() else {
            return Vec::new();
        };
        let conventions = ctx.conventions;
        let has = |fqcn: &str| method.attributes.iter().any(|attr| ctx.attribute_matches(attr, fqcn));

        if !(has(&conventions.admin_action_attribute) && has(&conventions.route_attribute)) {
            return Vec::new();
        }

        vec![self
            .meta
            .diagnostic(
                format!(
                    "Method {}() must not use both #[AdminAction] and #[Route].",
                    method.name
                ),
                method.line,
            )
            .with_tip("#[AdminAction] already registers the route; remove the #[Route] attribute.")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::InMemoryFacts;
    use crate::names::NameContext;
    use crate::rules::test_support::*;
    use crate::syntax::{AttributeUsage, ClassDeclaration, MethodDeclaration, SyntaxBundle};

    fn bundle(attributes: &[&str]) -> SyntaxBundle {
        let mut method = MethodDeclaration::new("approve", 42);
        method.attributes = attributes
            .iter()
            .enumerate()
            .map(|(i, name)| AttributeUsage::new(name, 40 + i))
            .collect();
        let mut class = ClassDeclaration::new("UserCrudController", 12);
        class.methods.push(method);

        let names = NameContext::new(Some("App\\Controller\\Admin"))
            .with_import(ADMIN_ACTION, None)
            .with_import("Symfony\\Component\\Routing\\Attribute\\Route", None);
        SyntaxBundle::new("UserCrudController.json", names).with_class(class)
    }

    #[test]
    fn test_both_attributes() {
        let diags = run_rule(
            &ForbidAdminActionWithRouteRule::new(),
            &bundle(&["AdminAction", "Route"]),
            InMemoryFacts::new(),
        );

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].identifier, "easyAdmin.forbidAdminActionWithRoute");
        assert_eq!(diags[0].location.line, 42);
        assert!(diags[0].message.contains("approve()"));
    }

    #[test]
    fn test_qualified_route_name() {
        let diags = run_rule(
            &ForbidAdminActionWithRouteRule::new(),
            &bundle(&["AdminAction", "\\Symfony\\Component\\Routing\\Attribute\\Route"]),
            InMemoryFacts::new(),
        );
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_single_attribute_passes() {
        for attributes in [&["AdminAction"][..], &["Route"], &["Route", "IsGranted"]] {
            assert!(run_rule(&ForbidAdminActionWithRouteRule::new(), &bundle(attributes), InMemoryFacts::new()).is_empty());
        }
    }
}
