use crate::diagnostic::Diagnostic;
use crate::heuristics::{camel_to_kebab, is_action_test_name, ucfirst};
use crate::rule::{ConventionRule, RuleCategory, RuleContext, RuleMeta};
use crate::rules::{crud_controller_under_test, test_methods};
use crate::syntax::{NodeKind, SyntaxNode};

/// Every custom `#[AdminAction]` of the covered CRUD controller needs a test
pub struct CustomActionTestCoverageRule {
    meta: RuleMeta,
}

impl Default for CustomActionTestCoverageRule {
    fn default() -> Self {
        Self::new()
    }
}

impl CustomActionTestCoverageRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(
                "symfonyWebTest.easyAdminCustomActionTestCoverage",
                "easyadmin-custom-action-test-coverage",
            )
            .with_category(RuleCategory::Coverage)
            .with_description("Custom admin actions of a covered CRUD controller must be tested"),
        }
    }
}

impl ConventionRule for CustomActionTestCoverageRule {
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
        let conventions = ctx.conventions;
        let Some(controller) = crud_controller_under_test(ctx, class, &conventions.web_test_case) else {
            return Vec::new();
        };

        let tests = test_methods(ctx, class);
        let missing: Vec<&str> = controller
            .own_methods()
            .filter(|m| m.is_public() && !m.is_magic())
            .filter(|m| m.has_attribute(&conventions.admin_action_attribute))
            .map(|m| m.name.as_str())
            .filter(|action| !tests.iter().any(|t| is_action_test_name(&t.name, action)))
            .collect();

        let Some(first) = missing.first() else {
            return Vec::new();
        };

        vec![self
            .meta
            .diagnostic(
                format!("Missing tests for custom actions: {}", missing.join(", ")),
                class.line,
            )
            .with_tip(format!(
                "Add a test method test{}() for action {}, triggering it with $client->request(\"GET\", \"/admin/your-entity/{{id}}/{}\")",
                ucfirst(first),
                first,
                camel_to_kebab(first)
            ))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{ClassFacts, InMemoryFacts, MethodSignature, Visibility};
    use crate::names::NameContext;
    use crate::rules::test_support::*;
    use crate::syntax::{ArgValue, Argument, AttributeUsage, ClassDeclaration, MethodDeclaration, SyntaxBundle};

    const CONTROLLER: &str = "App\\Controller\\Admin\\UserCrudController";

    fn bundle(tests: &[&str]) -> SyntaxBundle {
        let mut class = ClassDeclaration::new("UserCrudControllerTest", 16);
        class.extends = Some("AbstractWebTestCase".to_string());
        class.attributes.push(
            AttributeUsage::new("CoversClass", 15)
                .with_arg(Argument::positional(ArgValue::ClassReference("UserCrudController".into()))),
        );
        for (i, name) in tests.iter().enumerate() {
            class.methods.push(MethodDeclaration::new(name, 20 + i * 10));
        }

        let names = NameContext::new(Some("App\\Tests\\Controller\\Admin"))
            .with_import(CONTROLLER, None)
            .with_import("PHPUnit\\Framework\\Attributes\\CoversClass", None)
            .with_import(WEB_TEST_CASE, None);
        SyntaxBundle::new("UserCrudControllerTest.json", names).with_class(class)
    }

    fn action(name: &str) -> MethodSignature {
        let mut method = MethodSignature::new(name, CONTROLLER);
        method.attributes.push(AttributeUsage::new(ADMIN_ACTION, 0));
        method
    }

    fn facts() -> InMemoryFacts {
        let mut private_action = action("resetToken");
        private_action.visibility = Visibility::Private;
        let mut inherited = action("exportAll");
        inherited.declaring_class = "App\\Controller\\Admin\\BaseCrudController".to_string();

        InMemoryFacts::new().with_class(
            ClassFacts::new(CONTROLLER)
                .with_parents(&[CRUD])
                .with_method(action("approveUser"))
                .with_method(action("archive"))
                .with_method(private_action)
                .with_method(inherited)
                .with_method(MethodSignature::new("configureFields", CONTROLLER)),
        )
    }

    #[test]
    fn test_lists_untested_actions() {
        let diags = run_rule(&CustomActionTestCoverageRule::new(), &bundle(&["testIndex"]), facts());

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Missing tests for custom actions: approveUser, archive");
        assert_eq!(diags[0].location.line, 16);

        let tip = diags[0].tip.as_deref().unwrap();
        assert!(tip.contains("testApproveUser()"));
        assert!(tip.contains("/admin/your-entity/{id}/approve-user"));
    }

    #[test]
    fn test_accepted_test_names() {
        let full = bundle(&["testApproveUserAction", "testArchiveKeepsHistory"]);
        assert!(run_rule(&CustomActionTestCoverageRule::new(), &full, facts()).is_empty());

        let partial = bundle(&["testCustomActionApproveUser"]);
        let diags = run_rule(&CustomActionTestCoverageRule::new(), &partial, facts());
        assert_eq!(diags[0].message, "Missing tests for custom actions: archive");
    }

    #[test]
    fn test_requires_crud_controller_and_web_base() {
        let plain = InMemoryFacts::new().with_class(ClassFacts::new(CONTROLLER).with_method(action("archive")));
        assert!(run_rule(&CustomActionTestCoverageRule::new(), &bundle(&[]), plain).is_empty());

        let mut unrelated = bundle(&[]);
        unrelated.classes[0].extends = Some("TestCase".to_string());
        assert!(run_rule(&CustomActionTestCoverageRule::new(), &unrelated, facts()).is_empty());
    }
}
