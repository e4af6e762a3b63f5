//! RDF node model
//!
//! A closed sum over the three kinds of RDF term the loader understands.
//! Parser output is converted into these types at the source boundary so the
//! rest of the pipeline never depends on the parser's own term model.

use std::fmt;

/// An RDF literal as read from the source, before classification.
///
/// The datatype and language are carried exactly as the parser reported them;
/// deciding whether the literal is typed, language-tagged or plain is the
/// normalizer's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    /// Lexical form
    pub value: String,
    /// Datatype IRI, if the parser reported one
    pub datatype: Option<String>,
    /// Language tag, if any
    pub language: Option<String>,
}

impl Literal {
    /// A literal with no datatype and no language
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// A literal with an explicit datatype IRI
    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    /// A language-tagged literal
    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }
}

/// An RDF term: IRI, blank node or literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Node {
    /// Full IRI, not yet contracted
    Iri(String),
    /// Document-local blank node identifier, without the `_:` sentinel
    Blank(String),
    /// Literal value
    Literal(Literal),
}

impl Node {
    pub fn iri(iri: impl Into<String>) -> Self {
        Node::Iri(iri.into())
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Node::Blank(id.into())
    }

    /// The IRI string, if this is an IRI node
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Node::Iri(iri) => Some(iri),
            _ => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Iri(iri) => write!(f, "<{}>", iri),
            Node::Blank(id) => write!(f, "_:{}", id),
            Node::Literal(lit) => {
                write!(f, "{:?}", lit.value)?;
                if let Some(lang) = &lit.language {
                    write!(f, "@{}", lang)?;
                }
                if let Some(dt) = &lit.datatype {
                    write!(f, "^^<{}>", dt)?;
                }
                Ok(())
            }
        }
    }
}

/// A single statement read from a source, with its named graph if the
/// serialization carries one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: Node,
    pub predicate: Node,
    pub object: Node,
    /// Named graph IRI (quad formats only)
    pub graph: Option<String>,
}

impl Triple {
    pub fn new(subject: Node, predicate: Node, object: Node) -> Self {
        Self {
            subject,
            predicate,
            object,
            graph: None,
        }
    }

    /// Attach a named graph
    pub fn in_graph(mut self, graph: impl Into<String>) -> Self {
        self.graph = Some(graph.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Node::iri("http://example.org/a").to_string(), "<http://example.org/a>");
        assert_eq!(Node::blank("b0").to_string(), "_:b0");
        assert_eq!(Node::Literal(Literal::lang("Baum", "de")).to_string(), "\"Baum\"@de");
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Node::iri("http://x").as_iri(), Some("http://x"));
        assert!(Node::blank("b").as_iri().is_none());
        assert!(Node::Literal(Literal::plain("x")).as_iri().is_none());
    }
}
