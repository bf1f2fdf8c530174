//! Controller tests must extend the base web test case

use super::controller::is_controller_class;
use crate::diagnostic::Diagnostic;
use crate::facts::Lookup;
use crate::names::short_name;
use crate::rule::{is_test_class_name, ConventionRule, RuleCategory, RuleContext, RuleMeta};
use crate::syntax::{NodeKind, SyntaxNode};

pub struct ControllerTestBaseRule {
    meta: RuleMeta,
}

impl Default for ControllerTestBaseRule {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerTestBaseRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new("symfonyWebTest.controllerTestBase", "controller-test-base")
                .with_category(RuleCategory::Correctness)
                .with_description("Controller test classes must extend the base web test case")
                .with_rationale(
                    "The base web test case provides the HTTP client, test database setup and \
                     teardown, login helpers and EasyAdmin-specific assertions.",
                )
                .with_example_bad("final class UserControllerTest extends TestCase {}")
                .with_example_good("final class UserControllerTest extends AbstractWebTestCase {}"),
        }
    }

    fn tip(base: &str, test_class: &str) -> String {
        format!(
            r#"Extending the base web test case gives the test:
- an HTTP client (createClientWithDatabase())
- test database setup and cleanup
- loginAsAdmin() / loginAsUser() helpers
- form interaction and response assertions
- EasyAdmin test helpers

Example:
```php
use {base};

final class {short} extends {base_short}
{{
    public function testIndex(): void
    {{
        $client = static::createClientWithDatabase();
        $this->loginAsAdmin($client);

        $client->request('GET', '/my-route');
        $this->assertResponseIsSuccessful();
    }}
}}
```

See https://symfony.com/doc/current/testing.html#application-tests"#,
            base = base,
            short = short_name(test_class),
            base_short = short_name(base),
        )
    }
}

impl ConventionRule for ControllerTestBaseRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::ClassDeclaration
    }

    fn applies(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> bool {
        let Some(class) = node.as_class() else {
            return false;
        };
        !class.is_abstract && ctx.class_name().is_some_and(|name| is_test_class_name(&name))
    }

    fn evaluate(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let (Some(class), Some(test_class)) = (node.as_class(), ctx.class_name()) else {
            return Vec::new();
        };

        let facts = match ctx.class_facts() {
            Lookup::Found(facts) if facts.is_abstract => return Vec::new(),
            Lookup::Faulted => return Vec::new(),
            lookup => lookup.into_found(),
        };

        let covers_controller = ctx
            .tested_classes(class)
            .iter()
            .any(|candidate| is_controller_class(candidate, ctx.facts, ctx.conventions));
        if !covers_controller {
            return Vec::new();
        }

        let base = &ctx.conventions.web_test_case;
        if ctx.class_extends(base) != Some(false) {
            return Vec::new();
        }

        let current_parent = match &facts {
            Some(facts) => facts.parent().map(String::from),
            None => class.extends.as_deref().map(|parent| ctx.names.resolve(parent)),
        }
        .unwrap_or_else(|| "none".to_string());

        vec![self
            .meta
            .diagnostic(
                format!(
                    "Controller test class \"{}\" must extend {}, current parent: {}.",
                    test_class, base, current_parent
                ),
                class.line,
            )
            .with_tip(Self::tip(base, &test_class))]
    }
}
