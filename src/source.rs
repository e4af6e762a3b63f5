//! Triple Stream Adapter
//!
//! Wraps the oxigraph streaming parser behind `TripleSource`, converting its
//! terms into the crate's own `Node` model. A source can be iterated more than
//! once; how that is achieved (re-parsing or buffering) is a `ScanStrategy`.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use oxigraph::io::{RdfFormat, RdfParser};
use oxigraph::model::{GraphName, NamedOrBlankNode, Quad, Term};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::node::{Literal, Node, Triple};
use crate::{Error, Result};

/// Media type assumed when none is given
pub const DEFAULT_MIME_TYPE: &str = "application/rdf+xml";

/// Iterator over the triples of one pass
pub type TripleIter<'a> = Box<dyn Iterator<Item = Result<Triple>> + 'a>;

/// A re-iterable stream of triples.
pub trait TripleSource: Send + Sync {
    /// Name used in logs and error messages (usually the file path)
    fn name(&self) -> &str;

    /// Start a fresh pass over the triples
    fn triples(&self) -> Result<TripleIter<'_>>;
}

/// Map a MIME type to a parser format.
pub fn format_for_mime(mime_type: &str) -> Result<RdfFormat> {
    let mime = mime_type.trim().to_ascii_lowercase();
    let format = match mime.as_str() {
        "application/rdf+xml" | "application/xml" | "text/xml" => Some(RdfFormat::RdfXml),
        "text/turtle" | "application/turtle" | "application/x-turtle" => Some(RdfFormat::Turtle),
        "application/n-triples" | "text/plain" => Some(RdfFormat::NTriples),
        "application/n-quads" => Some(RdfFormat::NQuads),
        "application/trig" => Some(RdfFormat::TriG),
        "text/n3" => Some(RdfFormat::N3),
        other => RdfFormat::from_media_type(other),
    };
    format.ok_or_else(|| Error::Configuration(format!("unsupported RDF media type '{}'", mime_type)))
}

/// An RDF file parsed on every pass.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
    format: RdfFormat,
}

impl FileSource {
    /// Create a source for `path`, defaulting to RDF/XML when no MIME type is given
    pub fn new(path: impl AsRef<Path>, mime_type: Option<&str>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let format = format_for_mime(mime_type.unwrap_or(DEFAULT_MIME_TYPE))?;
        Ok(Self {
            name: path.display().to_string(),
            path,
            format,
        })
    }

    fn parse_error(&self, message: impl ToString) -> Error {
        Error::Parser {
            path: self.name.clone(),
            message: message.to_string(),
        }
    }
}

impl TripleSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn triples(&self) -> Result<TripleIter<'_>> {
        let file = File::open(&self.path)?;
        let parser = RdfParser::from_format(self.format);
        debug!(file = %self.name, format = ?self.format, "parsing");

        let quads = parser.for_reader(BufReader::new(file));
        Ok(Box::new(quads.map(move |quad| {
            let quad = quad.map_err(|e| self.parse_error(e))?;
            convert_quad(quad).map_err(|msg| self.parse_error(msg))
        })))
    }
}

/// Triples held in memory; every pass iterates the same buffer.
#[derive(Debug, Clone)]
pub struct BufferedSource {
    name: String,
    triples: Vec<Triple>,
}

impl BufferedSource {
    /// Materialize one full pass of another source
    pub fn load(source: &dyn TripleSource) -> Result<Self> {
        let triples = source.triples()?.collect::<Result<Vec<_>>>()?;
        debug!(file = %source.name(), triples = triples.len(), "buffered source");
        Ok(Self {
            name: source.name().to_string(),
            triples,
        })
    }

    pub fn from_triples(name: impl Into<String>, triples: Vec<Triple>) -> Self {
        Self {
            name: name.into(),
            triples,
        }
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }
}

impl TripleSource for BufferedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn triples(&self) -> Result<TripleIter<'_>> {
        Ok(Box::new(self.triples.iter().cloned().map(Ok)))
    }
}

/// How a source is made available for more than one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStrategy {
    /// Parse the input again for every pass
    #[default]
    Reparse,
    /// Parse once and keep all triples in memory
    Buffer,
}

impl ScanStrategy {
    /// Wrap a source according to the strategy
    pub fn prepare(self, source: Box<dyn TripleSource>) -> Result<Box<dyn TripleSource>> {
        match self {
            ScanStrategy::Reparse => Ok(source),
            ScanStrategy::Buffer => Ok(Box::new(BufferedSource::load(source.as_ref())?)),
        }
    }
}

fn convert_subject(subject: NamedOrBlankNode) -> Node {
    match subject {
        NamedOrBlankNode::NamedNode(n) => Node::Iri(n.into_string()),
        NamedOrBlankNode::BlankNode(b) => Node::Blank(b.as_str().to_string()),
    }
}

fn convert_term(term: Term) -> std::result::Result<Node, String> {
    match term {
        Term::NamedNode(n) => Ok(Node::Iri(n.into_string())),
        Term::BlankNode(b) => Ok(Node::Blank(b.as_str().to_string())),
        Term::Literal(lit) => Ok(Node::Literal(Literal {
            value: lit.value().to_string(),
            datatype: Some(lit.datatype().as_str().to_string()),
            language: lit.language().map(str::to_string),
        })),
        #[allow(unreachable_patterns)]
        other => Err(format!("unsupported term {}", other)),
    }
}

fn convert_quad(quad: Quad) -> std::result::Result<Triple, String> {
    let graph = match quad.graph_name {
        GraphName::NamedNode(n) => Some(n.into_string()),
        _ => None,
    };
    Ok(Triple {
        subject: convert_subject(quad.subject),
        predicate: Node::Iri(quad.predicate.into_string()),
        object: convert_term(quad.object)?,
        graph,
    })
}
