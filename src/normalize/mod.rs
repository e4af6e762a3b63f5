//! Node normalization and the contraction cache

pub mod cache;
pub mod normalizer;

pub use cache::ContractionCache;
pub use normalizer::{LiteralParts, LiteralShape, NodeNormalizer, RDF_LANG_STRING, XSD_STRING};
