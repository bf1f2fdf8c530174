//! Tested-class resolution
//!
//! Infers which production class(es) a test class validates. Three sources
//! are tried in priority order:
//!
//! 1. `#[CoversClass(...)]` attributes on the class
//! 2. `@coversDefaultClass` / `@covers` directives in the class doc comment
//! 3. The test class name itself (`App\Tests\FooTest` -> `App\Foo`), used
//!    only when the first two yield nothing
//!
//! The result is ordered and deduplicated. Resolution never fails; an empty
//! list means no candidate was found.

use crate::names::{canonical, same_class, NameContext, SEPARATOR};
use crate::syntax::{ArgValue, AttributeUsage, ClassDeclaration};
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

static COVERS_DEFAULT_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@coversDefaultClass\s+(\S+)").unwrap());

static COVERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@covers\s+(\S+)").unwrap());

/// Characters stripped from each doc comment line
const DOC_LINE_DECORATION: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B', '*'];

/// Namespace segments that mark test code
const TEST_SEGMENTS: [&str; 4] = ["\\Tests\\", "\\tests\\", "\\Test\\", "\\test\\"];

/// Stateless resolver; safe to share across threads
#[derive(Debug, Clone)]
pub struct TestedClassNameResolver {
    covers_attribute: String,
}

impl Default for TestedClassNameResolver {
    fn default() -> Self {
        Self::new("PHPUnit\\Framework\\Attributes\\CoversClass")
    }
}

impl TestedClassNameResolver {
    pub fn new(covers_attribute: &str) -> Self {
        Self {
            covers_attribute: canonical(covers_attribute).to_string(),
        }
    }

    /// Candidate tested classes for `class`, whose fully-qualified name is
    /// `test_class_name`.
    pub fn resolve(
        &self,
        class: &ClassDeclaration,
        test_class_name: &str,
        names: &NameContext,
    ) -> Vec<String> {
        let mut candidates = self.from_attributes(&class.attributes, names);

        if let Some(doc) = &class.doc_comment {
            candidates.extend(from_doc_comment(doc, names));
        }

        if candidates.is_empty() {
            candidates.extend(infer_from_test_name(test_class_name));
        }

        let mut unique: Vec<String> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !candidate.is_empty() && !unique.contains(&candidate) {
                unique.push(candidate);
            }
        }

        debug!("Tested classes for {}: {:?}", test_class_name, unique);
        unique
    }

    /// Classes named by covers attributes, in declaration order
    pub fn from_attributes(&self, attributes: &[AttributeUsage], names: &NameContext) -> Vec<String> {
        attributes
            .iter()
            .filter(|attr| same_class(&names.resolve(&attr.name), &self.covers_attribute))
            .filter_map(|attr| class_from_argument(attr.first_positional()?, names))
            .collect()
    }
}

/// Keywords that name a class relative to the one being declared
const RELATIVE_CLASS_KEYWORDS: [&str; 3] = ["self", "static", "parent"];

fn class_from_argument(value: &ArgValue, names: &NameContext) -> Option<String> {
    let raw = match value {
        ArgValue::ClassReference(name) => name,
        ArgValue::String(raw) => raw,
        _ => return None,
    };
    if RELATIVE_CLASS_KEYWORDS
        .iter()
        .any(|keyword| raw.trim().eq_ignore_ascii_case(keyword))
    {
        return None;
    }
    names.resolve_raw(raw)
}

/// Classes named by `@coversDefaultClass` / `@covers` directives
fn from_doc_comment(doc: &str, names: &NameContext) -> Vec<String> {
    let mut found = Vec::new();

    for line in doc.split(['\n', '\r']) {
        let line = line.trim_matches(DOC_LINE_DECORATION);
        if line.is_empty() {
            continue;
        }

        let captured = COVERS_DEFAULT_CLASS
            .captures(line)
            .or_else(|| COVERS.captures(line));

        if let Some(raw) = captured.and_then(|c| c.get(1)) {
            if let Some(name) = normalize_directive(raw.as_str(), names) {
                found.push(name);
            }
        }
    }

    found
}

/// Turn a directive value into a class name, skipping method-only and
/// relative (`self::`, `static::`, `parent::`) references.
fn normalize_directive(raw: &str, names: &NameContext) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || value.starts_with("::") {
        return None;
    }
    if ["self::", "static::", "parent::"]
        .iter()
        .any(|prefix| value.starts_with(prefix))
    {
        return None;
    }

    let class = value.split_once("::").map_or(value, |(class, _)| class);
    names.resolve_raw(class)
}

/// `App\Tests\Controller\UserControllerTest` -> `App\Controller\UserController`
fn infer_from_test_name(test_class_name: &str) -> Option<String> {
    let stripped = canonical(test_class_name).strip_suffix("Test")?;

    let separator = SEPARATOR.to_string();
    let mut inferred = stripped.to_string();
    for segment in TEST_SEGMENTS {
        inferred = inferred.replace(segment, &separator);
    }
    Some(inferred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Argument;

    const TEST_NAME: &str = "App\\Tests\\Controller\\UserControllerTest";

    fn names() -> NameContext {
        NameContext::new(Some("App\\Tests\\Controller"))
            .with_import("App\\Controller\\UserController", None)
            .with_import("App\\Controller\\OrderController", None)
            .with_import("PHPUnit\\Framework\\Attributes\\CoversClass", None)
    }

    fn covers(value: ArgValue) -> AttributeUsage {
        AttributeUsage::new("CoversClass", 5).with_arg(Argument::positional(value))
    }

    fn class_with(attributes: Vec<AttributeUsage>, doc: Option<&str>) -> ClassDeclaration {
        let mut class = ClassDeclaration::new("UserControllerTest", 6);
        class.attributes = attributes;
        class.doc_comment = doc.map(String::from);
        class
    }

    #[test]
    fn test_attribute_strategy() {
        let class = class_with(
            vec![
                covers(ArgValue::ClassReference("OrderController".into())),
                covers(ArgValue::String("\\Vendor\\Thing".into())),
                covers(ArgValue::String("UserController".into())),
                covers(ArgValue::String("Support\\Fixture".into())),
                covers(ArgValue::Int(3)),
            ],
            None,
        );

        let resolved = TestedClassNameResolver::default().resolve(&class, TEST_NAME, &names());
        assert_eq!(
            resolved,
            vec![
                "App\\Controller\\OrderController",
                "Vendor\\Thing",
                "App\\Controller\\UserController",
                "App\\Tests\\Controller\\Support\\Fixture",
            ]
        );
    }

    #[test]
    fn test_relative_class_keywords_are_skipped() {
        let class = class_with(
            vec![
                covers(ArgValue::ClassReference("static".into())),
                covers(ArgValue::ClassReference("self".into())),
                covers(ArgValue::String("parent".into())),
                covers(ArgValue::ClassReference("UserController".into())),
            ],
            None,
        );

        let resolved = TestedClassNameResolver::default().resolve(&class, TEST_NAME, &names());
        assert_eq!(resolved, vec!["App\\Controller\\UserController"]);
    }

    #[test]
    fn test_attribute_precedes_inference() {
        let class = class_with(vec![covers(ArgValue::ClassReference("OrderController".into()))], None);

        let resolved = TestedClassNameResolver::default().resolve(&class, TEST_NAME, &names());
        assert_eq!(resolved, vec!["App\\Controller\\OrderController"]);
    }

    #[test]
    fn test_unimported_attribute_is_ignored() {
        let names = NameContext::new(Some("App\\Tests"));
        let class = class_with(vec![covers(ArgValue::ClassReference("\\App\\Other".into()))], None);

        let resolved = TestedClassNameResolver::default().resolve(&class, "App\\Tests\\FooTest", &names);
        assert_eq!(resolved, vec!["App\\Foo"]);
    }

    #[test]
    fn test_doc_comment_directives() {
        let doc = "/**\n * @coversDefaultClass \\App\\Service\\Mailer\n * @covers OrderController::create\n * @covers ::helper\n * @covers self::other\n * @covers static::build\n * @covers parent::setUp\n * @covers\n */";
        let class = class_with(vec![], Some(doc));

        let resolved = TestedClassNameResolver::default().resolve(&class, TEST_NAME, &names());
        assert_eq!(
            resolved,
            vec!["App\\Service\\Mailer", "App\\Controller\\OrderController"]
        );
    }

    #[test]
    fn test_covers_method_reference_keeps_class() {
        let class = class_with(vec![], Some("/** @covers \\App\\Foo::bar */"));

        let resolved = TestedClassNameResolver::default().resolve(&class, TEST_NAME, &names());
        assert_eq!(resolved, vec!["App\\Foo"]);
    }

    #[test]
    fn test_attribute_and_doc_comment_are_deduplicated() {
        let class = class_with(
            vec![covers(ArgValue::ClassReference("UserController".into()))],
            Some("/** @coversDefaultClass UserController */"),
        );

        let resolved = TestedClassNameResolver::default().resolve(&class, TEST_NAME, &names());
        assert_eq!(resolved, vec!["App\\Controller\\UserController"]);
    }

    #[test]
    fn test_inference_from_name() {
        let class = class_with(vec![], None);
        let resolver = TestedClassNameResolver::default();

        assert_eq!(
            resolver.resolve(&class, TEST_NAME, &names()),
            vec!["App\\Controller\\UserController"]
        );
        assert_eq!(
            resolver.resolve(&class, "App\\test\\Unit\\Test\\FooTest", &names()),
            vec!["App\\Unit\\Foo"]
        );
        assert!(resolver.resolve(&class, "App\\Tests\\UserControllerHelper", &names()).is_empty());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let class = class_with(
            vec![covers(ArgValue::ClassReference("UserController".into()))],
            Some("/** @covers \\App\\Other */"),
        );
        let resolver = TestedClassNameResolver::default();

        let first = resolver.resolve(&class, TEST_NAME, &names());
        let second = resolver.resolve(&class, TEST_NAME, &names());
        assert_eq!(first, second);
    }
}
