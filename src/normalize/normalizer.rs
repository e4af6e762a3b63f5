//! Node normalization: IRIs to CURIEs, literals to (value, datatype, language)

use std::sync::OnceLock;

use regex::Regex;

use super::cache::ContractionCache;
use crate::node::{Literal, Node, Triple};
use crate::prefix::PrefixRegistry;
use crate::storage::StatementRow;
use crate::{Error, Result};

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

fn language_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z]{1,8}(-[A-Za-z0-9]{1,8})*$").expect("valid regex")
    })
}

/// Decomposed literal: lexical value, contracted datatype, language tag
pub type LiteralParts = (String, Option<String>, Option<String>);

/// The three literal shapes of the RDF literal model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralShape {
    Typed,
    LanguageTagged,
    Plain,
}

impl LiteralShape {
    /// Classify a literal, rejecting anything that fits none of the shapes.
    pub fn classify(literal: &Literal) -> Result<Self> {
        match (literal.datatype.as_deref(), literal.language.as_deref()) {
            (None | Some(XSD_STRING), None) => Ok(LiteralShape::Plain),
            (Some(RDF_LANG_STRING), None) => Err(Error::MalformedLiteral(format!(
                "{:?} has datatype rdf:langString but no language tag",
                literal.value
            ))),
            (Some(_), None) => Ok(LiteralShape::Typed),
            (None | Some(RDF_LANG_STRING), Some(lang)) => {
                if language_tag_pattern().is_match(lang) {
                    Ok(LiteralShape::LanguageTagged)
                } else {
                    Err(Error::MalformedLiteral(format!(
                        "{:?} has invalid language tag {:?}",
                        literal.value, lang
                    )))
                }
            }
            (Some(dt), Some(lang)) => Err(Error::MalformedLiteral(format!(
                "{:?} has both datatype <{}> and language tag {:?}",
                literal.value, dt, lang
            ))),
        }
    }
}

/// Turns parsed nodes into the strings stored in statement rows.
///
/// Holds a shared borrow of the registry, so the registry cannot change
/// while a normalizer (and its cache) is alive.
#[derive(Debug)]
pub struct NodeNormalizer<'r> {
    registry: &'r PrefixRegistry,
    cache: ContractionCache,
    explicit_string_datatype: bool,
    blank_node_scope: Option<String>,
}

impl<'r> NodeNormalizer<'r> {
    pub fn new(registry: &'r PrefixRegistry) -> Self {
        Self {
            registry,
            cache: ContractionCache::new(),
            explicit_string_datatype: false,
            blank_node_scope: None,
        }
    }

    /// Emit `xsd:string` / `rdf:langString` for plain and tagged literals
    pub fn with_explicit_string_datatype(mut self, enabled: bool) -> Self {
        self.explicit_string_datatype = enabled;
        self
    }

    /// Prefix blank node identifiers with a per-file scope, or stop doing so
    pub fn set_blank_node_scope(&mut self, scope: Option<String>) {
        self.blank_node_scope = scope;
    }

    pub fn cache(&self) -> &ContractionCache {
        &self.cache
    }

    /// Contract an IRI through the session cache
    pub fn contract(&mut self, iri: &str) -> String {
        let registry = self.registry;
        self.cache
            .get_or_compute(iri, |key| registry.contract(key).into_owned())
    }

    /// Normalize an IRI or blank node.
    pub fn normalize_node(&mut self, node: &Node) -> Result<String> {
        match node {
            Node::Iri(iri) => Ok(self.contract(iri)),
            Node::Blank(id) => Ok(match &self.blank_node_scope {
                Some(scope) => format!("_:{}_{}", scope, id),
                None => format!("_:{}", id),
            }),
            Node::Literal(lit) => Err(Error::MalformedLiteral(format!(
                "literal {:?} found where a resource was expected",
                lit.value
            ))),
        }
    }

    /// Decompose a literal into value, datatype and language.
    pub fn normalize_literal(&mut self, literal: &Literal) -> Result<LiteralParts> {
        let value = literal.value.clone();
        match LiteralShape::classify(literal)? {
            LiteralShape::Typed => {
                let datatype = literal.datatype.as_deref().map(|dt| self.contract(dt));
                Ok((value, datatype, None))
            }
            LiteralShape::LanguageTagged => {
                let datatype = self
                    .explicit_string_datatype
                    .then(|| self.contract(RDF_LANG_STRING));
                Ok((value, datatype, literal.language.clone()))
            }
            LiteralShape::Plain => {
                let datatype = self
                    .explicit_string_datatype
                    .then(|| self.contract(XSD_STRING));
                Ok((value, datatype, None))
            }
        }
    }

    /// Normalize a whole triple into a statement row.
    ///
    /// `id` and `graph` are left for the caller to fill in.
    pub fn normalize_triple(&mut self, triple: &Triple) -> Result<StatementRow> {
        let subject = self.normalize_node(&triple.subject)?;
        let predicate = self.normalize_node(&triple.predicate)?;
        let mut row = StatementRow::new(subject, predicate);
        match &triple.object {
            Node::Literal(lit) => {
                let (value, datatype, language) = self.normalize_literal(lit)?;
                row.value = Some(value);
                row.datatype = datatype;
                row.language = language;
            }
            resource => {
                row.object = Some(self.normalize_node(resource)?);
            }
        }
        Ok(row)
    }
}
