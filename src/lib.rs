//! # rdf-sql-bulkloader
//!
//! Loads serialized RDF graphs into relational statement tables.
//!
//! The pipeline:
//! - Prefix registry built from named prefix maps plus explicit overrides
//! - Optional first pass discovering SHACL `sh:prefix`/`sh:namespace` declarations
//! - Node normalization (CURIE contraction, literal decomposition, blank nodes)
//! - Chunked inserts into SQLite, committed once per invocation
//! - Optional rdftab-compatible `statements` mirror table

pub mod node;
pub mod prefix;
pub mod normalize;
pub mod source;
pub mod chunk;
pub mod storage;
pub mod loader;
pub mod config;
pub mod output;
pub mod ui;

// Re-exports for convenient access
pub use node::{Literal, Node, Triple};
pub use prefix::{PrefixRegistry, ShaclPrefixScanner, BuiltinPrefixMaps, PrefixMapProvider};
pub use normalize::{ContractionCache, NodeNormalizer};
pub use source::{FileSource, BufferedSource, TripleSource, ScanStrategy};
pub use storage::{SqliteStore, StatementRow, StatementLayout};
pub use loader::{BulkLoader, CancelFlag, LoadContext, LoadReport, LoadState};
pub use config::LoaderConfig;

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for loader operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Malformed literal: {0}")]
    MalformedLiteral(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Parse error in {path}: {message}")]
    Parser { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Load cancelled")]
    Cancelled,
}
