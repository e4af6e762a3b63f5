//! Prefix registry and CURIE contraction

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::named::PrefixMapProvider;
use crate::{Error, Result};

/// Ordered prefix → namespace map with first-registered-wins semantics.
///
/// Contraction picks the longest registered namespace that is a prefix of the
/// IRI, which yields the shortest `prefix:suffix` form. When two prefixes
/// share a namespace, the one registered first is used.
#[derive(Debug, Clone, Default)]
pub struct PrefixRegistry {
    entries: Vec<(String, String)>,
    by_prefix: HashMap<String, usize>,
    by_namespace: HashMap<String, usize>,
    /// Distinct namespace lengths, longest first
    namespace_lengths: Vec<usize>,
}

impl PrefixRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an explicit map plus named prefix maps.
    ///
    /// Explicit entries are registered first and therefore take precedence;
    /// named maps follow left to right, each only filling prefixes that are
    /// still unknown.
    pub fn build(
        explicit: &BTreeMap<String, String>,
        named_maps: &[String],
        provider: &dyn PrefixMapProvider,
        require_non_empty: bool,
    ) -> Result<Self> {
        let mut registry = Self::new();
        for (prefix, namespace) in explicit {
            registry.merge(prefix, namespace);
        }

        if !named_maps.is_empty() {
            for (prefix, namespace) in provider.load(named_maps)? {
                registry.merge(&prefix, &namespace);
            }
        }

        if require_non_empty && registry.is_empty() {
            return Err(Error::Configuration(
                "prefix map is empty; supply prefix_map or named_prefix_maps".to_string(),
            ));
        }

        debug!(
            prefixes = registry.len(),
            named = ?named_maps,
            "built prefix registry"
        );
        Ok(registry)
    }

    /// Register a prefix unless it is already known.
    ///
    /// Returns `true` if the entry was inserted.
    pub fn merge(&mut self, prefix: &str, namespace: &str) -> bool {
        if self.by_prefix.contains_key(prefix) {
            return false;
        }

        let idx = self.entries.len();
        self.entries.push((prefix.to_string(), namespace.to_string()));
        self.by_prefix.insert(prefix.to_string(), idx);

        if !namespace.is_empty() && !self.by_namespace.contains_key(namespace) {
            self.by_namespace.insert(namespace.to_string(), idx);
            if let Err(pos) = self
                .namespace_lengths
                .binary_search_by(|probe| namespace.len().cmp(probe))
            {
                self.namespace_lengths.insert(pos, namespace.len());
            }
        }
        true
    }

    /// Contract an IRI to `prefix:suffix`, or return it unchanged.
    pub fn contract<'a>(&self, iri: &'a str) -> Cow<'a, str> {
        for &len in &self.namespace_lengths {
            // An IRI equal to a namespace would contract to an empty local part
            if len >= iri.len() {
                continue;
            }
            let Some(candidate) = iri.get(..len) else {
                continue;
            };
            if let Some(&idx) = self.by_namespace.get(candidate) {
                let prefix = &self.entries[idx].0;
                return Cow::Owned(format!("{}:{}", prefix, &iri[len..]));
            }
        }
        Cow::Borrowed(iri)
    }

    /// Namespace registered for a prefix
    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.by_prefix
            .get(prefix)
            .map(|&idx| self.entries[idx].1.as_str())
    }

    /// Entries in registration order
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
