use crate::diagnostic::Diagnostic;
use crate::rule::{ConventionRule, RuleCategory, RuleContext, RuleMeta};
use crate::syntax::{NodeKind, SyntaxNode};

const REQUIRED_PARAMETERS: [&str; 2] = ["routeName", "routePath"];

/// `#[AdminAction]` must name both its route and its path
pub struct AdminActionRouteParametersRule {
    meta: RuleMeta,
}

impl Default for AdminActionRouteParametersRule {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminActionRouteParametersRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(
                "easyadmin.admin.action.route.parameters",
                "admin-action-route-parameters",
            )
            .with_category(RuleCategory::Correctness)
            .with_description("#[AdminAction] needs named routeName and routePath arguments")
            .with_example_good("#[AdminAction(routePath: '{entityId}/approve', routeName: 'approve')]"),
        }
    }
}

impl ConventionRule for AdminActionRouteParametersRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::MethodDeclaration
    }

    fn applies(&self, node: &SyntaxNode<'_>, _ctx: &RuleContext<'_>) -> bool {
        node.as_method().is_some_and(|method| !method.attributes.is_empty())
    }

    fn evaluate(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Some(method) = node.as_method() else {
            return Vec::new();
        };
        let admin_action = &ctx.conventions.admin_action_attribute;

        method
            .attributes
            .iter()
            .filter(|attr| ctx.attribute_is(attr, admin_action))
            .flat_map(|attr| {
                REQUIRED_PARAMETERS
                    .iter()
                    .filter(|param| !attr.has_named(param))
                    .map(|param| {
                        self.meta.diagnostic(
                            format!(
                                "The #[AdminAction] attribute must have both \"routeName\" and \"routePath\" parameters, \"{}\" is missing.",
                                param
                            ),
                            attr.line,
                        )
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}
