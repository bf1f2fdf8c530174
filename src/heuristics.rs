//! Best-effort source and name heuristics
//!
//! These predicates scan method source excerpts and method names with
//! regular expressions. They are not parsers: formatting the host parser
//! would accept can still slip past them, and the rules that use them only
//! ever report when a heuristic positively finds something to require.

use regex::Regex;
use std::sync::LazyLock;

/// `->add(TextFilter::new('name'` in a `configureFilters` body
static FILTER_CONFIG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"->add\s*\(\s*([A-Za-z]+Filter)::new\s*\(\s*['"]([^'"]+)['"]"#).unwrap()
});

static SET_REQUIRED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"->setRequired\s*\(\s*true\s*\)").unwrap());

/// `Field::new(...)->...required...true` on one line
static FIELD_REQUIRED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Field::new\s*\([^)]+\)\s*->.*required.*true").unwrap());

static UNPROCESSABLE_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"assertResponseStatusCodeSame\s*\(\s*422\s*\)").unwrap());

static BATCH_TEST_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^test(Batch|Bulk|Mass)").unwrap());

static UPPERCASE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]").unwrap());

/// Filters configured in a `configureFilters` body, as `Type:field`
pub fn configured_filters(source: &str) -> Vec<String> {
    FILTER_CONFIG
        .captures_iter(source)
        .map(|c| format!("{}:{}", &c[1], &c[2]))
        .collect()
}

/// Whether a `configureFields` body marks any field as required
pub fn declares_required_field(source: &str) -> bool {
    SET_REQUIRED.is_match(source) || FIELD_REQUIRED.is_match(source)
}

/// Whether a test body asserts a validation failure
pub fn asserts_validation_failure(source: &str) -> bool {
    UNPROCESSABLE_STATUS.is_match(source)
        || source.contains("invalid-feedback")
        || source.contains("should not be blank")
}

/// Name-only controller guess, for classes reflection does not know
pub fn looks_like_controller(class_name: &str) -> bool {
    class_name.ends_with("Controller")
}

pub fn is_test_method(name: &str) -> bool {
    name.starts_with("test")
}

pub fn is_batch_test_name(name: &str) -> bool {
    BATCH_TEST_NAME.is_match(name)
}

/// `test*` method whose name suggests search or filter coverage
pub fn is_search_test_name(name: &str) -> bool {
    is_test_method(name) && contains_any_ignore_case(name, &["search", "filter", "query"])
}

/// `test*` method whose name suggests validation coverage
pub fn is_validation_test_name(name: &str) -> bool {
    is_test_method(name)
        && contains_any_ignore_case(name, &["validation", "error", "required", "blank", "empty"])
}

/// Whether `test_name` covers the custom action `action`
pub fn is_action_test_name(test_name: &str, action: &str) -> bool {
    let upper = ucfirst(action);
    let exact = [
        format!("test{}", upper),
        format!("test{}Action", upper),
        format!("testCustomAction{}", upper),
    ];

    exact.iter().any(|candidate| candidate == test_name)
        || (is_test_method(test_name) && contains_any_ignore_case(test_name, &[action]))
}

/// `approveUser` -> `approve-user`
pub fn camel_to_kebab(name: &str) -> String {
    UPPERCASE
        .replace_all(&lcfirst(name), "-$0")
        .to_lowercase()
}

pub fn ucfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lcfirst(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn contains_any_ignore_case(haystack: &str, needles: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    needles
        .iter()
        .any(|needle| haystack.contains(&needle.to_lowercase()))
}
