//! Web tests must run in separate processes

use crate::diagnostic::Diagnostic;
use crate::facts::Lookup;
use crate::names::{same_class, short_name};
use crate::rule::{ConventionRule, RuleCategory, RuleContext, RuleMeta};
use crate::syntax::{NodeKind, SyntaxNode};

pub struct RequireRunInSeparateProcessRule {
    meta: RuleMeta,
}

impl Default for RequireRunInSeparateProcessRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RequireRunInSeparateProcessRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(
                "symfonyWebTest.requireRunInSeparateProcess",
                "require-run-in-separate-process",
            )
            .with_category(RuleCategory::Correctness)
            .with_description("Web test cases must carry #[RunTestsInSeparateProcesses]")
            .with_rationale("Kernel and database state leak between web tests sharing a process."),
        }
    }
}

impl ConventionRule for RequireRunInSeparateProcessRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::ClassDeclaration
    }

    fn applies(&self, node: &SyntaxNode<'_>, _ctx: &RuleContext<'_>) -> bool {
        node.as_class().is_some_and(|class| class.name.is_some())
    }

    fn evaluate(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let (Some(class), Some(class_name)) = (node.as_class(), ctx.class_name()) else {
            return Vec::new();
        };

        // Only classes reflection knows about
        let Lookup::Found(facts) = ctx.class_facts() else {
            return Vec::new();
        };

        let base = &ctx.conventions.web_test_case;
        if same_class(&class_name, base) || !facts.is_subclass_of(base) {
            return Vec::new();
        }

        let attribute = &ctx.conventions.separate_process_attribute;
        if class.attributes.iter().any(|attr| ctx.attribute_matches(attr, attribute)) {
            return Vec::new();
        }

        vec![self
            .meta
            .diagnostic(
                format!(
                    "Test class {} must use the #[{}] attribute to isolate its tests",
                    class_name,
                    short_name(attribute)
                ),
                class.line,
            )
            .with_tip(format!(
                "Import {} and add #[{}] to the class",
                attribute,
                short_name(attribute)
            ))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{ClassFacts, InMemoryFacts};
    use crate::names::NameContext;
    use crate::rules::test_support::*;
    use crate::syntax::{AttributeUsage, ClassDeclaration, SyntaxBundle};

    fn bundle(attribute: Option<&str>) -> SyntaxBundle {
        let mut class = ClassDeclaration::new("UserControllerTest", 9);
        if let Some(name) = attribute {
            class.attributes.push(AttributeUsage::new(name, 8));
        }
        SyntaxBundle::new("UserControllerTest.json", NameContext::new(Some("App\\Tests"))).with_class(class)
    }

    fn facts() -> InMemoryFacts {
        InMemoryFacts::new().with_class(
            ClassFacts::new("App\\Tests\\UserControllerTest").with_parents(&[WEB_TEST_CASE]),
        )
    }

    #[test]
    fn test_missing_attribute() {
        let diags = run_rule(&RequireRunInSeparateProcessRule::new(), &bundle(None), facts());

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].identifier, "symfonyWebTest.requireRunInSeparateProcess");
        assert_eq!(diags[0].location.line, 9);
        assert!(diags[0].message.contains("App\\Tests\\UserControllerTest"));
    }

    #[test]
    fn test_attribute_name_forms() {
        for name in [
            "RunTestsInSeparateProcesses",
            "PHPUnit\\Framework\\Attributes\\RunTestsInSeparateProcesses",
            "\\PHPUnit\\Framework\\Attributes\\RunTestsInSeparateProcesses",
            "Attributes\\RunTestsInSeparateProcesses",
        ] {
            assert!(
                run_rule(&RequireRunInSeparateProcessRule::new(), &bundle(Some(name)), facts()).is_empty(),
                "{} should be accepted",
                name
            );
        }
    }

    #[test]
    fn test_unknown_or_unrelated_classes() {
        assert!(run_rule(&RequireRunInSeparateProcessRule::new(), &bundle(None), InMemoryFacts::new()).is_empty());

        let unrelated = InMemoryFacts::new().with_class(
            ClassFacts::new("App\\Tests\\UserControllerTest").with_parents(&["PHPUnit\\Framework\\TestCase"]),
        );
        assert!(run_rule(&RequireRunInSeparateProcessRule::new(), &bundle(None), unrelated).is_empty());
    }

    #[test]
    fn test_base_class_itself_is_skipped() {
        let class = ClassDeclaration::new("AbstractWebTestCase", 3);
        let bundle = SyntaxBundle::new(
            "AbstractWebTestCase.json",
            NameContext::new(Some("Tourze\\PHPUnitSymfonyWebTest")),
        )
        .with_class(class);
        let facts = InMemoryFacts::new().with_class(ClassFacts::new(WEB_TEST_CASE));

        assert!(run_rule(&RequireRunInSeparateProcessRule::new(), &bundle, facts).is_empty());
    }
}
