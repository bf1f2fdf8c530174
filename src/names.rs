//! Per-file name resolution
//!
//! Maps a class-name token as written in source (`Foo`, `Sub\Foo`,
//! `\Vendor\Foo`, an imported alias) to its fully-qualified, canonical form
//! using the file's namespace and `use` imports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Namespace separator
pub const SEPARATOR: char = '\\';

/// Name-resolution context for one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameContext {
    /// Active namespace (`None` for the global namespace)
    #[serde(default)]
    pub namespace: Option<String>,

    /// Imported aliases (alias -> fully-qualified name)
    #[serde(default)]
    pub imports: BTreeMap<String, String>,
}

impl NameContext {
    pub fn new(namespace: Option<&str>) -> Self {
        Self {
            namespace: namespace
                .map(canonical)
                .filter(|ns| !ns.is_empty())
                .map(String::from),
            imports: BTreeMap::new(),
        }
    }

    /// Register a `use` import; the alias defaults to the last segment
    pub fn with_import(mut self, fqcn: &str, alias: Option<&str>) -> Self {
        let fqcn = canonical(fqcn).to_string();
        let alias = alias
            .map(String::from)
            .unwrap_or_else(|| short_name(&fqcn).to_string());
        self.imports.insert(alias, fqcn);
        self
    }

    /// Resolve a name token to its fully-qualified form.
    ///
    /// A leading separator marks the name as already fully qualified. Otherwise
    /// the first segment is looked up in the import table (case-insensitively,
    /// aliases are not case-sensitive), and finally the name is taken as
    /// relative to the current namespace.
    pub fn resolve(&self, name: &str) -> String {
        let name = name.trim();
        if let Some(qualified) = name.strip_prefix(SEPARATOR) {
            return canonical(qualified).to_string();
        }

        let (head, rest) = match name.split_once(SEPARATOR) {
            Some((head, rest)) => (head, Some(rest)),
            None => (name, None),
        };

        if let Some(imported) = self.import_for(head) {
            return match rest {
                Some(rest) => format!("{}{}{}", imported, SEPARATOR, rest),
                None => imported.to_string(),
            };
        }

        match &self.namespace {
            Some(ns) => format!("{}{}{}", ns, SEPARATOR, name),
            None => name.to_string(),
        }
    }

    /// Resolve a raw string that may or may not denote a class name.
    ///
    /// Returns `None` for blank input or input made only of separators.
    pub fn resolve_raw(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let fully_qualified = trimmed.starts_with(SEPARATOR);
        let normalized = canonical(trimmed);
        if normalized.is_empty() {
            return None;
        }

        if fully_qualified {
            Some(normalized.to_string())
        } else {
            Some(self.resolve(normalized))
        }
    }

    /// Fully-qualified name of a class declared in this file
    pub fn qualify_declared(&self, short: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}{}{}", ns, SEPARATOR, canonical(short)),
            None => canonical(short).to_string(),
        }
    }

    fn import_for(&self, alias: &str) -> Option<&str> {
        self.imports
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(alias))
            .map(|(_, fqcn)| fqcn.as_str())
    }
}

/// Strip leading separators so `\App\Foo` and `App\Foo` compare equal
pub fn canonical(name: &str) -> &str {
    name.trim().trim_start_matches(SEPARATOR)
}

/// Last segment of a qualified name
pub fn short_name(name: &str) -> &str {
    let name = canonical(name);
    name.rsplit(SEPARATOR).next().unwrap_or(name)
}

/// Class names compare case-insensitively after canonicalization
pub fn same_class(a: &str, b: &str) -> bool {
    canonical(a).eq_ignore_ascii_case(canonical(b))
}
