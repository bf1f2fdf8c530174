//! Controller recognition
//!
//! A class counts as a controller when any [`ControllerSignal`] matches its
//! facts. Signals are tried in a fixed order: name suffix, known base class,
//! controller trait. Interfaces and anonymous classes never count.

use crate::config::ConventionsConfig;
use crate::facts::{ClassFacts, FactsRepository, Lookup};
use crate::heuristics::looks_like_controller;

/// One way of recognizing a controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerSignal {
    /// Name ends with `Controller`
    NameSuffix,
    /// Extends or implements a known controller base
    KnownBase(String),
    /// Uses the framework's controller trait
    Trait(String),
}

impl ControllerSignal {
    /// Signals in evaluation order
    pub fn all(conventions: &ConventionsConfig) -> Vec<ControllerSignal> {
        let mut signals = vec![ControllerSignal::NameSuffix];
        signals.extend(
            conventions
                .controller_bases
                .iter()
                .map(|base| ControllerSignal::KnownBase(base.clone())),
        );
        signals.push(ControllerSignal::Trait(conventions.controller_trait.clone()));
        signals
    }

    pub fn matches(&self, facts: &ClassFacts) -> bool {
        match self {
            ControllerSignal::NameSuffix => looks_like_controller(&facts.name),
            ControllerSignal::KnownBase(base) => facts.is_subclass_of(base),
            ControllerSignal::Trait(name) => facts.uses_trait(name),
        }
    }
}

/// Whether `name` denotes a controller.
///
/// Unknown classes fall back to the name suffix; faulted lookups never
/// count.
pub fn is_controller_class(name: &str, facts: &FactsRepository, conventions: &ConventionsConfig) -> bool {
    match facts.lookup(name) {
        Lookup::Found(class) => {
            if class.is_interface || class.is_anonymous {
                return false;
            }
            ControllerSignal::all(conventions)
                .iter()
                .any(|signal| signal.matches(&class))
        }
        Lookup::Missing => looks_like_controller(name),
        Lookup::Faulted => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::InMemoryFacts;
    use std::sync::Arc;

    fn repo() -> FactsRepository {
        FactsRepository::new(Arc::new(
            InMemoryFacts::new()
                .with_class(ClassFacts::new("App\\Controller\\UserController"))
                .with_class(
                    ClassFacts::new("App\\Admin\\UserCrud")
                        .with_parents(&["EasyCorp\\Bundle\\EasyAdminBundle\\Controller\\AbstractCrudController"]),
                )
                .with_class(
                    ClassFacts::new("App\\Legacy\\Pages")
                        .with_traits(&["Symfony\\Bundle\\FrameworkBundle\\Controller\\ControllerTrait"]),
                )
                .with_class(ClassFacts::new("App\\Contract\\PaymentController").interface())
                .with_class(ClassFacts::new("App\\Service\\Mailer"))
                .with_fault("App\\Broken\\BrokenController"),
        ))
    }

    #[test]
    fn test_signal_order() {
        let signals = ControllerSignal::all(&ConventionsConfig::default());
        assert_eq!(signals.first(), Some(&ControllerSignal::NameSuffix));
        assert!(matches!(signals.last(), Some(ControllerSignal::Trait(_))));
        assert_eq!(signals.len(), 7);
    }

    #[test]
    fn test_recognition() {
        let repo = repo();
        let conventions = ConventionsConfig::default();

        assert!(is_controller_class("App\\Controller\\UserController", &repo, &conventions));
        assert!(is_controller_class("App\\Admin\\UserCrud", &repo, &conventions));
        assert!(is_controller_class("App\\Legacy\\Pages", &repo, &conventions));
        assert!(!is_controller_class("App\\Contract\\PaymentController", &repo, &conventions));
        assert!(!is_controller_class("App\\Service\\Mailer", &repo, &conventions));
    }

    #[test]
    fn test_unknown_and_faulted_classes() {
        let repo = repo();
        let conventions = ConventionsConfig::default();

        assert!(is_controller_class("App\\Controller\\OrderController", &repo, &conventions));
        assert!(!is_controller_class("App\\Service\\Unknown", &repo, &conventions));
        assert!(!is_controller_class("App\\Broken\\BrokenController", &repo, &conventions));
    }
}
