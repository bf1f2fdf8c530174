//! Class facts query surface
//!
//! Rules never inspect raw reflection data. They ask a [`FactsRepository`]
//! narrow questions (does the class exist, is it abstract, does it extend X)
//! and the repository answers from a pluggable [`FactsProvider`], memoizing
//! every successful lookup.

pub mod cache;

pub use cache::{CacheStats, FactsCache};

use crate::names::{canonical, same_class};
use crate::syntax::AttributeUsage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Error returned by a facts provider
#[derive(Debug, Error)]
pub enum FactsError {
    #[error("Reflection failed for {class}: {message}")]
    Reflection { class: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid facts snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

/// A declared method as seen through reflection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodSignature {
    pub name: String,

    #[serde(default)]
    pub visibility: Visibility,

    /// Class that declares the method (may be a parent)
    #[serde(default)]
    pub declaring_class: String,

    #[serde(default)]
    pub is_abstract: bool,

    /// Attributes with fully-qualified names
    #[serde(default)]
    pub attributes: Vec<AttributeUsage>,

    /// Source excerpt of the method body, when available
    #[serde(default)]
    pub source: Option<String>,
}

impl MethodSignature {
    pub fn new(name: &str, declaring_class: &str) -> Self {
        Self {
            name: name.to_string(),
            visibility: Visibility::Public,
            declaring_class: declaring_class.to_string(),
            is_abstract: false,
            attributes: Vec::new(),
            source: None,
        }
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// `__construct`, `__invoke` and friends
    pub fn is_magic(&self) -> bool {
        self.name.starts_with("__")
    }

    pub fn has_attribute(&self, fqcn: &str) -> bool {
        self.attributes.iter().any(|a| same_class(&a.name, fqcn))
    }
}

/// Resolved, immutable view of one class
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassFacts {
    /// Fully-qualified name
    pub name: String,

    #[serde(default)]
    pub is_abstract: bool,

    #[serde(default)]
    pub is_interface: bool,

    #[serde(default)]
    pub is_anonymous: bool,

    #[serde(default)]
    pub is_trait: bool,

    /// Parent chain, nearest first
    #[serde(default)]
    pub parents: Vec<String>,

    /// All implemented interfaces (including inherited ones)
    #[serde(default)]
    pub interfaces: Vec<String>,

    /// Used traits (including those of parents)
    #[serde(default)]
    pub traits: Vec<String>,

    /// Attributes with fully-qualified names
    #[serde(default)]
    pub attributes: Vec<AttributeUsage>,

    #[serde(default)]
    pub methods: Vec<MethodSignature>,
}

impl ClassFacts {
    pub fn new(name: &str) -> Self {
        Self {
            name: canonical(name).to_string(),
            ..Default::default()
        }
    }

    pub fn with_parents(mut self, parents: &[&str]) -> Self {
        self.parents = parents.iter().map(|p| canonical(p).to_string()).collect();
        self
    }

    pub fn with_interfaces(mut self, interfaces: &[&str]) -> Self {
        self.interfaces = interfaces.iter().map(|i| canonical(i).to_string()).collect();
        self
    }

    pub fn with_traits(mut self, traits: &[&str]) -> Self {
        self.traits = traits.iter().map(|t| canonical(t).to_string()).collect();
        self
    }

    pub fn with_attribute(mut self, attribute: AttributeUsage) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_method(mut self, method: MethodSignature) -> Self {
        self.methods.push(method);
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn interface(mut self) -> Self {
        self.is_interface = true;
        self
    }

    /// Strict subtype check over parents and interfaces; a class is never
    /// its own subclass.
    pub fn is_subclass_of(&self, fqcn: &str) -> bool {
        if same_class(&self.name, fqcn) {
            return false;
        }
        self.parents
            .iter()
            .chain(self.interfaces.iter())
            .any(|ancestor| same_class(ancestor, fqcn))
    }

    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| same_class(i, interface))
    }

    pub fn uses_trait(&self, name: &str) -> bool {
        self.traits.iter().any(|t| same_class(t, name))
    }

    pub fn has_attribute(&self, fqcn: &str) -> bool {
        self.attributes.iter().any(|a| same_class(&a.name, fqcn))
    }

    pub fn parent(&self) -> Option<&str> {
        self.parents.first().map(String::as_str)
    }

    pub fn method(&self, name: &str) -> Option<&MethodSignature> {
        self.methods.iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Methods declared by this class itself (not inherited)
    pub fn own_methods(&self) -> impl Iterator<Item = &MethodSignature> {
        self.methods
            .iter()
            .filter(|m| m.declaring_class.is_empty() || same_class(&m.declaring_class, &self.name))
    }
}

/// Capability interface over the host's reflection service
pub trait FactsProvider: Send + Sync {
    /// Resolve a class by fully-qualified name.
    ///
    /// `Ok(None)` means the class is unknown; `Err` is an environment fault.
    fn lookup(&self, name: &str) -> Result<Option<ClassFacts>, FactsError>;
}

/// JSON snapshot of provider data
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FactsSnapshot {
    #[serde(default)]
    pub classes: Vec<ClassFacts>,

    /// Classes whose lookup fails with a reflection fault
    #[serde(default)]
    pub faults: Vec<String>,
}

/// Provider backed by an in-memory table
#[derive(Debug, Default)]
pub struct InMemoryFacts {
    classes: HashMap<String, ClassFacts>,
    faults: HashSet<String>,
}

impl InMemoryFacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, facts: ClassFacts) -> Self {
        self.insert(facts);
        self
    }

    /// Make lookups of `name` fail
    pub fn with_fault(mut self, name: &str) -> Self {
        self.faults.insert(FactsCache::key(name));
        self
    }

    pub fn insert(&mut self, facts: ClassFacts) {
        self.classes.insert(FactsCache::key(&facts.name), facts);
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Load a snapshot exported by the host
    pub fn load(path: &Path) -> Result<Self, FactsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, FactsError> {
        let snapshot: FactsSnapshot = serde_json::from_str(content)?;
        Ok(Self::from(snapshot))
    }
}

impl From<FactsSnapshot> for InMemoryFacts {
    fn from(snapshot: FactsSnapshot) -> Self {
        let mut facts = Self::new();
        for class in snapshot.classes {
            facts.insert(class);
        }
        for fault in &snapshot.faults {
            facts.faults.insert(FactsCache::key(fault));
        }
        facts
    }
}

impl FactsProvider for InMemoryFacts {
    fn lookup(&self, name: &str) -> Result<Option<ClassFacts>, FactsError> {
        let key = FactsCache::key(name);
        if self.faults.contains(&key) {
            return Err(FactsError::Reflection {
                class: canonical(name).to_string(),
                message: "class could not be loaded".to_string(),
            });
        }
        Ok(self.classes.get(&key).cloned())
    }
}

/// Outcome of a repository lookup
#[derive(Debug, Clone)]
pub enum Lookup {
    Found(Arc<ClassFacts>),
    Missing,
    /// The provider faulted; treat as unknown
    Faulted,
}

impl Lookup {
    pub fn found(&self) -> Option<&Arc<ClassFacts>> {
        match self {
            Lookup::Found(facts) => Some(facts),
            _ => None,
        }
    }

    pub fn into_found(self) -> Option<Arc<ClassFacts>> {
        match self {
            Lookup::Found(facts) => Some(facts),
            _ => None,
        }
    }
}

/// Memoizing query surface shared by all rules
pub struct FactsRepository {
    provider: Arc<dyn FactsProvider>,
    cache: FactsCache,
}

impl FactsRepository {
    pub fn new(provider: Arc<dyn FactsProvider>) -> Self {
        Self {
            provider,
            cache: FactsCache::new(),
        }
    }

    /// Repository that knows no classes
    pub fn empty() -> Self {
        Self::new(Arc::new(InMemoryFacts::new()))
    }

    /// Resolve a class, consulting the cache first.
    ///
    /// Provider faults are logged and not cached.
    pub fn lookup(&self, name: &str) -> Lookup {
        let name = canonical(name);
        if name.is_empty() {
            return Lookup::Missing;
        }

        if let Some(cached) = self.cache.get(name) {
            return match cached {
                Some(facts) => Lookup::Found(facts),
                None => Lookup::Missing,
            };
        }

        match self.provider.lookup(name) {
            Ok(found) => {
                debug!("Resolved class facts for {} (known: {})", name, found.is_some());
                match self.cache.put(name, found.map(Arc::new)) {
                    Some(facts) => Lookup::Found(facts),
                    None => Lookup::Missing,
                }
            }
            Err(e) => {
                warn!("Class facts unavailable for {}: {}", name, e);
                Lookup::Faulted
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<ClassFacts>> {
        self.lookup(name).into_found()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_abstract(&self, name: &str) -> bool {
        self.get(name).is_some_and(|f| f.is_abstract)
    }

    pub fn is_interface_or_anonymous(&self, name: &str) -> bool {
        self.get(name).is_some_and(|f| f.is_interface || f.is_anonymous)
    }

    pub fn is_subclass_of(&self, name: &str, parent: &str) -> bool {
        self.get(name).is_some_and(|f| f.is_subclass_of(parent))
    }

    pub fn implements(&self, name: &str, interface: &str) -> bool {
        self.get(name).is_some_and(|f| f.implements(interface))
    }

    pub fn uses_trait(&self, name: &str, trait_name: &str) -> bool {
        self.get(name).is_some_and(|f| f.uses_trait(trait_name))
    }

    pub fn parent_of(&self, name: &str) -> Option<String> {
        self.get(name).and_then(|f| f.parent().map(String::from))
    }

    pub fn attributes_of(&self, name: &str) -> Vec<AttributeUsage> {
        self.get(name).map(|f| f.attributes.clone()).unwrap_or_default()
    }

    pub fn methods_of(&self, name: &str) -> Vec<MethodSignature> {
        self.get(name).map(|f| f.methods.clone()).unwrap_or_default()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl std::fmt::Debug for FactsRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactsRepository")
            .field("cache", &self.cache.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BASE: &str = "Tourze\\PHPUnitSymfonyWebTest\\AbstractWebTestCase";

    fn provider() -> InMemoryFacts {
        InMemoryFacts::new()
            .with_class(
                ClassFacts::new("App\\Tests\\UserControllerTest")
                    .with_parents(&[BASE, "PHPUnit\\Framework\\TestCase"]),
            )
            .with_class(ClassFacts::new("App\\Contract").interface())
            .with_fault("App\\Broken")
    }

    /// Counts provider calls
    struct Counting {
        inner: InMemoryFacts,
        calls: AtomicUsize,
    }

    impl FactsProvider for Counting {
        fn lookup(&self, name: &str) -> Result<Option<ClassFacts>, FactsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.lookup(name)
        }
    }

    #[test]
    fn test_subclass_is_transitive_and_strict() {
        let facts = ClassFacts::new("App\\A").with_parents(&["App\\B", "App\\C"]);
        assert!(facts.is_subclass_of("App\\C"));
        assert!(facts.is_subclass_of("\\app\\b"));
        assert!(!facts.is_subclass_of("App\\A"));
    }

    #[test]
    fn test_repository_queries() {
        let repo = FactsRepository::new(Arc::new(provider()));

        assert!(repo.exists("\\App\\Tests\\UserControllerTest"));
        assert!(repo.is_subclass_of("App\\Tests\\UserControllerTest", BASE));
        assert_eq!(
            repo.parent_of("App\\Tests\\UserControllerTest").as_deref(),
            Some(BASE)
        );
        assert!(repo.is_interface_or_anonymous("App\\Contract"));
        assert!(!repo.exists("App\\Nope"));
        assert!(repo.methods_of("App\\Nope").is_empty());
    }

    #[test]
    fn test_negative_results_are_cached() {
        let counting = Arc::new(Counting {
            inner: provider(),
            calls: AtomicUsize::new(0),
        });
        let repo = FactsRepository::new(counting.clone());

        assert!(!repo.exists("App\\Nope"));
        assert!(!repo.exists("App\\Nope"));
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_faults_are_not_cached() {
        let counting = Arc::new(Counting {
            inner: provider(),
            calls: AtomicUsize::new(0),
        });
        let repo = FactsRepository::new(counting.clone());

        assert!(matches!(repo.lookup("App\\Broken"), Lookup::Faulted));
        assert!(!repo.is_abstract("App\\Broken"));
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
        assert_eq!(repo.cache_stats().total_entries, 0);
    }

    #[test]
    fn test_own_methods() {
        let facts = ClassFacts::new("App\\Controller")
            .with_method(MethodSignature::new("approve", "App\\Controller"))
            .with_method(MethodSignature::new("index", "EasyCorp\\Base"));

        let own: Vec<&str> = facts.own_methods().map(|m| m.name.as_str()).collect();
        assert_eq!(own, vec!["approve"]);
    }

    #[test]
    fn test_snapshot_from_json() {
        let json = r#"{
            "classes": [{
                "name": "App\\Controller\\UserController",
                "parents": ["Symfony\\Bundle\\FrameworkBundle\\Controller\\AbstractController"],
                "methods": [{ "name": "index", "visibility": "protected" }]
            }],
            "faults": ["App\\Broken"]
        }"#;

        let facts = InMemoryFacts::from_json(json).unwrap();
        assert_eq!(facts.len(), 1);

        let user = facts.lookup("App\\Controller\\UserController").unwrap().unwrap();
        assert_eq!(user.methods[0].visibility, Visibility::Protected);
        assert!(facts.lookup("App\\Broken").is_err());
    }
}
