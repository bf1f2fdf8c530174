use crate::diagnostic::Diagnostic;
use crate::heuristics::{asserts_validation_failure, declares_required_field, is_validation_test_name};
use crate::rule::{ConventionRule, RuleCategory, RuleContext, RuleMeta};
use crate::rules::{crud_controller_under_test, test_methods};
use crate::syntax::{NodeKind, SyntaxNode};

pub struct RequiredFieldValidationTestRule {
    meta: RuleMeta,
}

impl Default for RequiredFieldValidationTestRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RequiredFieldValidationTestRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(
                "symfonyWebTest.easyAdminRequiredFieldValidationTest",
                "easyadmin-required-field-validation-test",
            )
            .with_category(RuleCategory::Coverage)
            .with_description("A CRUD controller with required fields needs a validation test"),
        }
    }
}

impl ConventionRule for RequiredFieldValidationTestRule {
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

        let has_required = controller
            .method("configureFields")
            .and_then(|m| m.source.as_deref())
            .is_some_and(declares_required_field);
        if !has_required {
            return Vec::new();
        }

        // A validation-named test with an unknown body counts as validating
        let validated = test_methods(ctx, class).iter().any(|t| {
            is_validation_test_name(&t.name)
                && t.source.as_deref().is_none_or(asserts_validation_failure)
        });
        if validated {
            return Vec::new();
        }

        vec![self
            .meta
            .diagnostic("Controller has required fields but no validation test", class.line)
            .with_tip(
                r#"Add a test such as testValidationErrors() that:
  1. submits the new/edit form with the required fields left empty
  2. asserts the response status is 422 (assertResponseStatusCodeSame(422))
  3. checks the page shows the "should not be blank" or .invalid-feedback errors"#,
            )]
    }
}
