//! Prefix handling
//!
//! - `registry`: prefix → namespace map and CURIE contraction
//! - `named`: built-in and file-backed named prefix maps
//! - `shacl`: discovery of in-band `sh:prefix`/`sh:namespace` declarations

pub mod registry;
pub mod named;
pub mod shacl;

pub use registry::PrefixRegistry;
pub use named::{BuiltinPrefixMaps, PrefixMapProvider, load_prefix_file};
pub use shacl::{ShaclPrefixScanner, SHACL_NAMESPACE, SHACL_PREFIX};
