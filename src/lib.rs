//! Covenant - convention lint engine for Symfony and EasyAdmin projects
//!
//! Checks PHP projects against team conventions for controllers, CRUD
//! admin classes and their web tests. The host exports two things: one
//! syntax bundle per source file (classes, methods, calls, attributes and
//! the file's name context) and a snapshot of reflection facts about the
//! classes those files mention. Covenant never parses PHP itself.
//!
//! # Architecture
//!
//! ```text
//! CLI/API -> Engine -> Dispatcher -> ConventionRule -> SyntaxNode
//!                                         |
//!                                         +-> FactsRepository -> FactsProvider
//! ```
//!
//! The engine loads configuration and bundles, the dispatcher walks each
//! bundle and routes nodes to the rules registered for their kind, and rules
//! query the memoizing facts repository through their [`RuleContext`].
//!
//! # Example
//!
//! ```no_run
//! use covenant::{Config, Engine, FactsRepository, InMemoryFacts};
//! use std::path::{Path, PathBuf};
//! use std::sync::Arc;
//!
//! let facts = InMemoryFacts::load(Path::new("facts.json")).unwrap();
//! let engine = Engine::new(Config::new(), Arc::new(FactsRepository::new(Arc::new(facts))));
//! let result = engine.lint(&[PathBuf::from("bundles/UserControllerTest.json")]);
//! std::process::exit(result.exit_code());
//! ```

pub mod config;
pub mod diagnostic;
pub mod dispatcher;
pub mod engine;
pub mod facts;
pub mod heuristics;
pub mod names;
pub mod output;
pub mod resolver;
pub mod rule;
pub mod rules;
pub mod syntax;

// Re-export main types
pub use config::{Config, ConfigError, ConventionsConfig, OutputFormat};
pub use diagnostic::{Diagnostic, Location, Severity};
pub use dispatcher::{AnalysisEnv, DispatchOutcome, Dispatcher, RuleFault, RuleRegistry, RuleTiming};
pub use engine::{Engine, FileReport, LintResult};
pub use facts::{
    ClassFacts, FactsError, FactsProvider, FactsRepository, InMemoryFacts, Lookup, MethodSignature,
};
pub use names::NameContext;
pub use output::{JsonFormatter, OutputFormatter, TextFormatter};
pub use resolver::TestedClassNameResolver;
pub use rule::{ConventionRule, RuleCategory, RuleContext, RuleMeta};
pub use syntax::{BundleError, NodeKind, SyntaxBundle, SyntaxNode};
