//! SHACL prefix declaration scanner
//!
//! Collects `sh:prefix` / `sh:namespace` pairs declared in the data itself:
//!
//! ```text
//! [] sh:prefix "GO" ;
//!    sh:namespace "http://purl.obolibrary.org/obo/GO_"^^xsd:anyURI .
//! ```

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::node::{Node, Triple};
use crate::Result;

pub const SHACL_PREFIX: &str = "http://www.w3.org/ns/shacl#prefix";
pub const SHACL_NAMESPACE: &str = "http://www.w3.org/ns/shacl#namespace";

fn prefix_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("valid regex"))
}

#[derive(Debug, Default)]
struct Declaration {
    prefix: Option<String>,
    namespace: Option<String>,
}

/// Accumulates SHACL prefix declarations over one or more passes.
#[derive(Debug, Default)]
pub struct ShaclPrefixScanner {
    declarations: Vec<Declaration>,
    by_subject: HashMap<Node, usize>,
}

impl ShaclPrefixScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a full triple stream and return the complete declarations.
    pub fn scan<I>(triples: I) -> Result<Vec<(String, String)>>
    where
        I: IntoIterator<Item = Result<Triple>>,
    {
        let mut scanner = Self::new();
        for triple in triples {
            scanner.observe(&triple?);
        }
        Ok(scanner.finish())
    }

    /// Record a triple if it is part of a prefix declaration.
    pub fn observe(&mut self, triple: &Triple) {
        let Some(predicate) = triple.predicate.as_iri() else {
            return;
        };
        let is_prefix = predicate == SHACL_PREFIX;
        if !is_prefix && predicate != SHACL_NAMESPACE {
            return;
        }

        let value = match &triple.object {
            Node::Literal(lit) => lit.value.clone(),
            Node::Iri(iri) if !is_prefix => iri.clone(),
            _ => return,
        };

        let next = self.declarations.len();
        let idx = *self
            .by_subject
            .entry(triple.subject.clone())
            .or_insert(next);
        if idx == next {
            self.declarations.push(Declaration::default());
        }

        let decl = &mut self.declarations[idx];
        if is_prefix {
            decl.prefix = Some(value);
        } else {
            decl.namespace = Some(value);
        }
    }

    /// Complete (prefix, namespace) pairs in first-seen subject order.
    ///
    /// Subjects declaring only one half are dropped.
    pub fn finish(self) -> Vec<(String, String)> {
        let total = self.declarations.len();
        let pairs: Vec<(String, String)> = self
            .declarations
            .into_iter()
            .filter_map(|decl| match (decl.prefix, decl.namespace) {
                (Some(prefix), Some(namespace)) => {
                    if prefix_name_pattern().is_match(&prefix) {
                        Some((prefix, namespace))
                    } else {
                        warn!(prefix = %prefix, namespace = %namespace, "ignoring invalid SHACL prefix");
                        None
                    }
                }
                _ => None,
            })
            .collect();

        if pairs.len() < total {
            debug!(
                declared = total,
                usable = pairs.len(),
                "dropped incomplete SHACL prefix declarations"
            );
        }
        pairs
    }
}
