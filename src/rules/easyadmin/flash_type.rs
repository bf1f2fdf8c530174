use crate::diagnostic::Diagnostic;
use crate::rule::{ConventionRule, RuleCategory, RuleContext, RuleMeta};
use crate::syntax::{NodeKind, SyntaxNode};

/// Flash message types must be Bootstrap alert variants.
///
/// EasyAdmin renders flashes as `alert-<type>`; `error` has no matching
/// class and is reported with its own message.
pub struct AddFlashTypeRule {
    meta: RuleMeta,
}

impl Default for AddFlashTypeRule {
    fn default() -> Self {
        Self::new()
    }
}

impl AddFlashTypeRule {
    pub fn new() -> Self {
        Self {
            meta: RuleMeta::new("easyAdmin.addFlashType", "add-flash-type")
                .with_category(RuleCategory::Style)
                .with_description("addFlash() types must be Bootstrap alert variants")
                .with_example_bad("$this->addFlash('error', 'Save failed');")
                .with_example_good("$this->addFlash('danger', 'Save failed');"),
        }
    }

    fn in_controller(&self, ctx: &RuleContext<'_>) -> bool {
        let conventions = ctx.conventions;
        [&conventions.abstract_controller, &conventions.crud_controller]
            .iter()
            .any(|base| ctx.class_extends(base).unwrap_or(false))
    }
}

impl ConventionRule for AddFlashTypeRule {
    fn meta(&self) -> &RuleMeta {
        &self.meta
    }

    fn node_kind(&self) -> NodeKind {
        NodeKind::MethodCall
    }

    fn applies(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> bool {
        node.as_call()
            .is_some_and(|call| call.method == "addFlash" && call.receiver.is_this())
            && ctx.scope.class.is_some()
    }

    fn evaluate(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let Some(call) = node.as_call() else {
            return Vec::new();
        };
        let Some(flash_type) = call.args.first().and_then(|arg| arg.value.as_str()) else {
            return Vec::new();
        };
        if !self.in_controller(ctx) {
            return Vec::new();
        }

        let flash = &ctx.conventions.flash;
        let diagnostic = if flash_type == flash.blocked {
            self.meta
                .diagnostic(
                    format!(
                        "Flash message type \"{}\" is not allowed in EasyAdmin. Use \"{}\" instead.",
                        flash.blocked, flash.replacement
                    ),
                    call.line,
                )
                .with_tip(format!(
                    "EasyAdmin styles flashes with Bootstrap alert classes; alert-{} does not exist.",
                    flash.blocked
                ))
        } else if !flash.allowed.iter().any(|allowed| allowed == flash_type) {
            self.meta
                .diagnostic(
                    format!(
                        "Invalid flash message type \"{}\". Allowed types: {}",
                        flash_type,
                        flash.allowed.join(", ")
                    ),
                    call.line,
                )
                .with_tip("Use one of the Bootstrap alert variants.")
        } else {
            return Vec::new();
        };

        vec![diagnostic]
    }
}
