//! Convention rule model
//!
//! A rule declares the node kind it inspects, a cheap applicability check
//! and an evaluation that turns reflection facts into diagnostics. All
//! collaborators reach the rule through [`RuleContext`]; rules hold no
//! per-call state and are shared across threads.

use crate::config::ConventionsConfig;
use crate::diagnostic::{Diagnostic, Severity};
use crate::facts::{FactsRepository, Lookup};
use crate::names::{canonical, same_class, short_name, NameContext, SEPARATOR};
use crate::resolver::TestedClassNameResolver;
use crate::syntax::{AttributeUsage, ClassDeclaration, NodeContext, NodeKind, SyntaxNode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule category for grouping related rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Structural requirements (base classes, attributes, return types)
    #[default]
    Correctness,
    /// Usage conventions (flash types, attribute combinations)
    Style,
    /// Test-coverage expectations for production members
    Coverage,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::Correctness => write!(f, "correctness"),
            RuleCategory::Style => write!(f, "style"),
            RuleCategory::Coverage => write!(f, "coverage"),
        }
    }
}

impl std::str::FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "correctness" => Ok(RuleCategory::Correctness),
            "style" => Ok(RuleCategory::Style),
            "coverage" | "tests" => Ok(RuleCategory::Coverage),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Static description of a rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleMeta {
    /// Stable diagnostic identifier
    pub id: String,

    /// Human-readable name
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub severity: Severity,

    #[serde(default)]
    pub category: RuleCategory,

    #[serde(default)]
    pub rationale: Option<String>,

    #[serde(default)]
    pub example_bad: Option<String>,

    #[serde(default)]
    pub example_good: Option<String>,
}

impl RuleMeta {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            severity: Severity::Error,
            category: RuleCategory::default(),
            rationale: None,
            example_bad: None,
            example_good: None,
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn with_category(mut self, category: RuleCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_rationale(mut self, rationale: &str) -> Self {
        self.rationale = Some(rationale.to_string());
        self
    }

    pub fn with_example_bad(mut self, example: &str) -> Self {
        self.example_bad = Some(example.to_string());
        self
    }

    pub fn with_example_good(mut self, example: &str) -> Self {
        self.example_good = Some(example.to_string());
        self
    }

    /// Diagnostic carrying this rule's identifier and default severity
    pub fn diagnostic(&self, message: impl Into<String>, line: usize) -> Diagnostic {
        Diagnostic::new(&self.id, message, line).with_severity(self.severity)
    }
}

/// Collaborators available to a rule while it inspects one node
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    pub facts: &'a FactsRepository,
    pub names: &'a NameContext,
    pub resolver: &'a TestedClassNameResolver,
    pub conventions: &'a ConventionsConfig,
    /// Enclosing class and method of the node
    pub scope: NodeContext<'a>,
}

impl<'a> RuleContext<'a> {
    /// Fully-qualified name of the enclosing class; `None` when anonymous
    pub fn class_name(&self) -> Option<String> {
        let short = self.scope.class?.name.as_deref()?;
        Some(self.names.qualify_declared(short))
    }

    /// Reflection facts of the enclosing class
    pub fn class_facts(&self) -> Lookup {
        match self.class_name() {
            Some(name) => self.facts.lookup(&name),
            None => Lookup::Missing,
        }
    }

    /// Whether `attr` names `fqcn` once resolved through the file's imports
    pub fn attribute_is(&self, attr: &AttributeUsage, fqcn: &str) -> bool {
        same_class(&self.names.resolve(&attr.name), fqcn)
    }

    /// Like [`attribute_is`](Self::attribute_is), but also accepts the
    /// written name matching the short or qualified form directly.
    pub fn attribute_matches(&self, attr: &AttributeUsage, fqcn: &str) -> bool {
        self.attribute_is(attr, fqcn) || written_name_matches(&attr.name, fqcn)
    }

    /// Candidate tested classes of the enclosing class
    pub fn tested_classes(&self, class: &ClassDeclaration) -> Vec<String> {
        match self.class_name() {
            Some(name) => self.resolver.resolve(class, &name, self.names),
            None => Vec::new(),
        }
    }

    /// First class named by a covers attribute on `class`
    pub fn covered_class(&self, class: &ClassDeclaration) -> Option<String> {
        self.resolver
            .from_attributes(&class.attributes, self.names)
            .into_iter()
            .next()
    }

    /// Whether the enclosing class extends `base`, transitively.
    ///
    /// Prefers reflection facts; when the class is unknown, falls back to the
    /// written `extends` clause (directly, or through the parent's facts).
    /// `None` when reflection faulted.
    pub fn class_extends(&self, base: &str) -> Option<bool> {
        let class = self.scope.class?;
        match self.class_facts() {
            Lookup::Found(facts) => Some(facts.is_subclass_of(base)),
            Lookup::Faulted => None,
            Lookup::Missing => {
                let Some(parent) = class.extends.as_deref() else {
                    return Some(false);
                };
                let parent = self.names.resolve(parent);
                if same_class(&parent, base) {
                    return Some(true);
                }
                match self.facts.lookup(&parent) {
                    Lookup::Found(facts) => Some(facts.is_subclass_of(base)),
                    Lookup::Missing => Some(false),
                    Lookup::Faulted => None,
                }
            }
        }
    }
}

fn written_name_matches(written: &str, fqcn: &str) -> bool {
    let written = canonical(written);
    let short = short_name(fqcn);
    written == short
        || same_class(written, fqcn)
        || written.ends_with(&format!("{}{}", SEPARATOR, short))
}

/// Test class naming convention: ends with `Test` and lives under a
/// `Tests` or `Test` namespace segment.
pub fn is_test_class_name(fqcn: &str) -> bool {
    fqcn.ends_with("Test") && (fqcn.contains("\\Tests\\") || fqcn.contains("\\Test\\"))
}

/// A convention check bound to one node kind
pub trait ConventionRule: Send + Sync {
    fn meta(&self) -> &RuleMeta;

    /// Node kind this rule inspects
    fn node_kind(&self) -> NodeKind;

    /// Cheap pre-check over the node and name context only
    fn applies(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> bool;

    /// Diagnostics for the node; called only when `applies` is true
    fn evaluate(&self, node: &SyntaxNode<'_>, ctx: &RuleContext<'_>) -> Vec<Diagnostic>;

    fn id(&self) -> &str {
        &self.meta().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{ClassFacts, InMemoryFacts};
    use std::sync::Arc;

    const BASE: &str = "Tourze\\PHPUnitSymfonyWebTest\\AbstractWebTestCase";

    #[test]
    fn test_category_from_str() {
        assert_eq!("coverage".parse::<RuleCategory>(), Ok(RuleCategory::Coverage));
        assert_eq!("Style".parse::<RuleCategory>(), Ok(RuleCategory::Style));
        assert!("perf".parse::<RuleCategory>().is_err());
    }

    #[test]
    fn test_meta_diagnostic() {
        let meta = RuleMeta::new("easyAdmin.addFlashType", "add-flash-type")
            .with_severity(Severity::Warning);
        let diag = meta.diagnostic("bad flash", 7);

        assert_eq!(diag.identifier, "easyAdmin.addFlashType");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.location.line, 7);
    }

    #[test]
    fn test_is_test_class_name() {
        assert!(is_test_class_name("App\\Tests\\Controller\\UserControllerTest"));
        assert!(is_test_class_name("App\\Test\\FooTest"));
        assert!(!is_test_class_name("App\\Tests\\Controller\\UserControllerHelper"));
        assert!(!is_test_class_name("App\\Controller\\UserControllerTest"));
    }

    #[test]
    fn test_written_name_matches() {
        let fqcn = "PHPUnit\\Framework\\Attributes\\RunTestsInSeparateProcesses";
        assert!(written_name_matches("RunTestsInSeparateProcesses", fqcn));
        assert!(written_name_matches("\\PHPUnit\\Framework\\Attributes\\RunTestsInSeparateProcesses", fqcn));
        assert!(written_name_matches("Attributes\\RunTestsInSeparateProcesses", fqcn));
        assert!(!written_name_matches("RunTestsInSeparateProcessesX", fqcn));
    }

    #[test]
    fn test_class_extends_falls_back_to_syntax() {
        let facts = FactsRepository::new(Arc::new(
            InMemoryFacts::new()
                .with_class(ClassFacts::new("App\\Tests\\BaseCase").with_parents(&[BASE])),
        ));
        let names = NameContext::new(Some("App\\Tests"));
        let resolver = TestedClassNameResolver::default();
        let conventions = ConventionsConfig::default();

        let mut class = ClassDeclaration::new("FooTest", 3);
        class.extends = Some("BaseCase".to_string());

        let ctx = RuleContext {
            facts: &facts,
            names: &names,
            resolver: &resolver,
            conventions: &conventions,
            scope: NodeContext {
                class: Some(&class),
                method: None,
            },
        };

        assert_eq!(ctx.class_name().as_deref(), Some("App\\Tests\\FooTest"));
        assert_eq!(ctx.class_extends(BASE), Some(true));
        assert_eq!(ctx.class_extends("Other\\Base"), Some(false));
    }
}
