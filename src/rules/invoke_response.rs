//! Invokable controllers must return a response

use crate::diagnostic::Diagnostic;
use crate::facts::Lookup;
use crate::heuristics::looks_like_controller;
use crate::names::{same_class, short_name};
use crate::rule::{ConventionRule, RuleCategory, RuleContext, RuleMeta};
use crate::syntax::{NodeKind, SyntaxNode};

/// Type keywords that can never denote a response
const SCALAR_TYPES: &[&str] = &[
    "void", "never", "mixed", "null", "array", "string", "int", "float", "bool", "false", "true",
    "iterable", "callable", "object", "self", "static",
];

pub struct InvokeResponseRule {
    meta: RuleMeta,
}

impl Default for InvokeResponseRule {
    fn default() -> Self {
        Self::new()
    }
}

impl InvokeResponseRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new("controller.invokeResponse", "invoke-response")
                .with_category(RuleCategory::Correctness)
                .with_description("Controller __invoke() must declare a response return type")
                .with_example_bad("public function __invoke(): array")
                .with_example_good("public function __invoke(): Response"),
        }
    }

    fn is_controller(&self, ctx: &RuleContext<'_>, class_name: &str) -> Option<bool> {
        let conventions = ctx.conventions;
        match ctx.class_facts() {
            Lookup::Found(facts) => Some(
                facts.is_subclass_of(&conventions.abstract_controller)
                    || facts.is_subclass_of(&conventions.legacy_controller)
                    || looks_like_controller(class_name),
            ),
            Lookup::Missing => Some(looks_like_controller(class_name)),
            Lookup::Faulted => None,
        }
    }

    /// Whether every member of the declared type is a response.
    ///
    /// Nullable types never qualify. `None` when reflection faulted on a
    /// member.
    fn declares_response(&self, ctx: &RuleContext<'_>, declared: &str) -> Option<bool> {
        let declared = declared.trim();
        if declared.starts_with('?') {
            return Some(false);
        }

        let members: Vec<&str> = declared
            .trim_matches(|c| c == '(' || c == ')')
            .split('|')
            .map(|m| m.trim().trim_matches(|c| c == '(' || c == ')'))
            .collect();
        if members.iter().any(|m| m.eq_ignore_ascii_case("null")) {
            return Some(false);
        }

        let mut all = true;
        for member in members {
            // Intersection: one response part suffices
            let mut any_part = false;
            for part in member.split('&') {
                match self.is_response_type(ctx, part.trim()) {
                    Some(true) => any_part = true,
                    Some(false) => {}
                    None => return None,
                }
            }
            all &= any_part;
        }
        Some(all)
    }

    fn is_response_type(&self, ctx: &RuleContext<'_>, token: &str) -> Option<bool> {
        if token.is_empty() || SCALAR_TYPES.iter().any(|s| s.eq_ignore_ascii_case(token)) {
            return Some(false);
        }

        let response = &ctx.conventions.response_class;
        let resolved = ctx.names.resolve(token);
        if same_class(&resolved, response) {
            return Some(true);
        }

        match ctx.facts.lookup(&resolved) {
            Lookup::Found(facts) => Some(facts.is_subclass_of(response)),
            // Best-effort for response classes the host did not export
            Lookup::Missing => Some(short_name(&resolved).ends_with(short_name(response))),
            Lookup::Faulted => None,
        }
    }
}

impl ConventionRule for InvokeResponseRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::MethodDeclaration
    }

    fn applies(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> bool {
        node.as_method()
            .is_some_and(|method| method.name.eq_ignore_ascii_case("__invoke"))
            && ctx.scope.class.is_some()
    }

    fn evaluate(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let (Some(method), Some(class_name)) = (node.as_method(), ctx.class_name()) else {
            return Vec::new();
        };

        if self.is_controller(ctx, &class_name) != Some(true) {
            return Vec::new();
        }

        let declared = method.return_type.as_deref().filter(|t| !t.trim().is_empty());
        if let Some(declared) = declared {
            if self.declares_response(ctx, declared) != Some(false) {
                return Vec::new();
            }
        }

        let response = &ctx.conventions.response_class;
        let mut tips = Vec::new();
        if declared.is_none() {
            tips.push(format!(
                "Add a return type declaration to the method signature, e.g. \": {}\".",
                short_name(response)
            ));
        }
        tips.push(format!(
            "Make sure it returns {} or a subclass (such as JsonResponse).",
            response
        ));

        vec![self
            .meta
            .diagnostic(
                format!(
                    "Controller {}::__invoke() must return {} or a subclass, declared return type: {}.",
                    class_name,
                    response,
                    declared.unwrap_or("none")
                ),
                method.line,
            )
            .with_tip(tips.join(" "))]
    }
}
