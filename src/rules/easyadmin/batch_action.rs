use crate::diagnostic::Diagnostic;
use crate::heuristics::is_batch_test_name;
use crate::rule::{ConventionRule, RuleCategory, RuleContext, RuleMeta};
use crate::syntax::{find_by_key, MethodCall, NodeKind, SyntaxNode};

/// Keys EasyAdmin reads from `ea` in a batch request
const BATCH_KEYS: [&str; 2] = ["batchActionName", "batchActionEntityIds"];

/// Batch action tests must post the `ea[batchActionName]` payload
pub struct BatchActionTestRule {
    meta: RuleMeta,
}

impl Default for BatchActionTestRule {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchActionTestRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new(
                "symfonyWebTest.easyAdminBatchActionTest",
                "easyadmin-batch-action-test",
            )
            .with_category(RuleCategory::Coverage)
            .with_description("Batch action tests must send EasyAdmin's batch request format"),
        }
    }
}

/// `request(method, uri, ['ea' => ['batchActionName' => ..., 'batchActionEntityIds' => ...]])`
fn is_batch_request(call: &MethodCall) -> bool {
    if call.method != "request" || call.args.len() < 3 {
        return false;
    }

    call.args[2]
        .value
        .as_array()
        .and_then(|params| find_by_key(params, "ea"))
        .and_then(|ea| ea.value.as_array())
        .is_some_and(|ea| BATCH_KEYS.iter().all(|key| find_by_key(ea, key).is_some()))
}

impl ConventionRule for BatchActionTestRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::MethodDeclaration
    }

    fn applies(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> bool {
        node.as_method()
            .is_some_and(|method| !method.is_abstract && is_batch_test_name(&method.name))
            && ctx.scope.class.is_some()
    }

    fn evaluate(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Some(method) = node.as_method() else {
            return Vec::new();
        };
        if ctx.class_extends(&ctx.conventions.web_test_case) != Some(true) {
            return Vec::new();
        }
        if method.calls.iter().any(is_batch_request) {
            return Vec::new();
        }

        vec![self
            .meta
            .diagnostic(
                format!(
                    "Batch action test \"{}\" must send the request in the EasyAdmin batch format",
                    method.name
                ),
                method.line,
            )
            .with_tip(
                r#"POST the batch payload under the "ea" key:
  $client->request('POST', $url, [
      'ea' => [
          'batchActionName' => 'batchDelete',
          'batchActionEntityIds' => [$entity->getId()],
      ],
  ]);"#,
            )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::InMemoryFacts;
    use crate::names::NameContext;
    use crate::rules::test_support::*;
    use crate::syntax::{ArgValue, Argument, ArrayItem, ClassDeclaration, MethodDeclaration, SyntaxBundle};

    fn entry(key: &str, value: ArgValue) -> ArrayItem {
        ArrayItem {
            key: Some(ArgValue::String(key.to_string())),
            value,
        }
    }

    fn request(params: ArgValue) -> MethodCall {
        MethodCall {
            receiver: ArgValue::Variable("client".into()),
            method: "request".to_string(),
            args: vec![
                Argument::positional(ArgValue::String("POST".into())),
                Argument::positional(ArgValue::String("/admin".into())),
                Argument::positional(params),
            ],
            line: 64,
        }
    }

    fn ea(keys: &[&str]) -> ArgValue {
        let inner = keys
            .iter()
            .map(|key| entry(key, ArgValue::Other))
            .collect();
        ArgValue::Array(vec![entry("ea", ArgValue::Array(inner))])
    }

    fn bundle(name: &str, calls: Vec<MethodCall>) -> SyntaxBundle {
        let mut method = MethodDeclaration::new(name, 60);
        method.calls = calls;
        let mut class = ClassDeclaration::new("UserCrudControllerTest", 12);
        class.extends = Some("AbstractWebTestCase".to_string());
        class.methods.push(method);

        let names = NameContext::new(Some("App\\Tests\\Controller\\Admin")).with_import(WEB_TEST_CASE, None);
        SyntaxBundle::new("UserCrudControllerTest.json", names).with_class(class)
    }

    #[test]
    fn test_batch_format_accepted() {
        let bundle = bundle("testBatchDelete", vec![request(ea(&["batchActionName", "batchActionEntityIds"]))]);
        assert!(run_rule(&BatchActionTestRule::new(), &bundle, InMemoryFacts::new()).is_empty());
    }

    #[test]
    fn test_incomplete_payload() {
        for calls in [
            vec![],
            vec![request(ea(&["batchActionName"]))],
            vec![request(ArgValue::Array(vec![entry("batchActionName", ArgValue::Other)]))],
            vec![request(ArgValue::Variable("payload".into()))],
        ] {
            let bundle = bundle("testBulkArchive", calls);
            let diags = run_rule(&BatchActionTestRule::new(), &bundle, InMemoryFacts::new());
            assert_eq!(diags.len(), 1);
            assert_eq!(diags[0].location.line, 60);
            assert!(diags[0].message.contains("\"testBulkArchive\""));
        }
    }

    #[test]
    fn test_other_methods_and_classes() {
        let plain = bundle("testIndex", vec![]);
        assert!(run_rule(&BatchActionTestRule::new(), &plain, InMemoryFacts::new()).is_empty());

        let mut unrelated = bundle("testMassUpdate", vec![]);
        unrelated.classes[0].extends = Some("TestCase".to_string());
        assert!(run_rule(&BatchActionTestRule::new(), &unrelated, InMemoryFacts::new()).is_empty());
    }
}
