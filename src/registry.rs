//! Domain registry
//!
//! Supplies the set of entities that multi-entity aggregation walks over.
//! The registry is a capability; [`StaticRegistry`] is the configuration
//! sourced implementation.

use std::collections::BTreeSet;

/// Source of known entity keys
pub trait DomainRegistry: Send + Sync {
    /// Every registered entity key, in ascending order
    fn list_entities(&self) -> BTreeSet<String>;
}

/// Fixed list of domains, usually read from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRegistry {
    domains: BTreeSet<String>,
}

impl StaticRegistry {
    /// Build a registry from domain names
    ///
    /// Names are trimmed; blanks and duplicates are dropped.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = domains
            .into_iter()
            .map(|d| d.as_ref().trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        Self { domains }
    }

    /// Number of registered domains
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// True when no domain is registered
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl DomainRegistry for StaticRegistry {
    fn list_entities(&self) -> BTreeSet<String> {
        self.domains.clone()
    }
}
