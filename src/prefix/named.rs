//! Named prefix maps
//!
//! A named map is either one of the built-in contexts (`semweb`, `obo`,
//! `merged`) or a path to a JSON/TOML file holding prefix → namespace pairs.

use std::path::Path;

use tracing::debug;

use crate::{Error, Result};

/// Source of named prefix maps.
pub trait PrefixMapProvider: Send + Sync {
    /// Load one named map as ordered (prefix, namespace) pairs
    fn load_one(&self, name: &str) -> Result<Vec<(String, String)>>;

    /// Load several maps, concatenated in the order given.
    ///
    /// Duplicates are left in place; the registry's first-wins merge
    /// resolves them.
    fn load(&self, names: &[String]) -> Result<Vec<(String, String)>> {
        let mut pairs = Vec::new();
        for name in names {
            let loaded = self.load_one(name)?;
            debug!(map = %name, entries = loaded.len(), "loaded named prefix map");
            pairs.extend(loaded);
        }
        Ok(pairs)
    }
}

/// Core semantic web vocabularies
const SEMWEB: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
    ("owl", "http://www.w3.org/2002/07/owl#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("sh", "http://www.w3.org/ns/shacl#"),
    ("skos", "http://www.w3.org/2004/02/skos/core#"),
    ("dce", "http://purl.org/dc/elements/1.1/"),
    ("dcterms", "http://purl.org/dc/terms/"),
    ("foaf", "http://xmlns.com/foaf/0.1/"),
    ("oboInOwl", "http://www.geneontology.org/formats/oboInOwl#"),
    ("prov", "http://www.w3.org/ns/prov#"),
    ("schema", "http://schema.org/"),
    ("void", "http://rdfs.org/ns/void#"),
    ("pav", "http://purl.org/pav/"),
];

/// OBO Foundry ontologies; each maps to `http://purl.obolibrary.org/obo/<ID>_`
const OBO_IDS: &[&str] = &[
    "BFO", "CHEBI", "CL", "CLO", "DOID", "ECO", "ENVO", "EFO", "FBbt", "GO", "HP",
    "IAO", "MONDO", "MP", "NCBITaxon", "NCIT", "OBI", "OGMS", "OMO", "PATO", "PCO",
    "PO", "PR", "RO", "SO", "UBERON", "UO", "ZFA",
];

const OBO_BASE: &str = "http://purl.obolibrary.org/obo/";

/// Built-in maps plus file-backed maps.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinPrefixMaps;

impl BuiltinPrefixMaps {
    /// Names recognised without touching the filesystem
    pub const NAMES: &'static [&'static str] = &["semweb", "obo", "merged"];

    fn semweb() -> Vec<(String, String)> {
        SEMWEB
            .iter()
            .map(|(p, ns)| (p.to_string(), ns.to_string()))
            .collect()
    }

    fn obo() -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = OBO_IDS
            .iter()
            .map(|id| (id.to_string(), format!("{}{}_", OBO_BASE, id)))
            .collect();
        pairs.push(("obo".to_string(), OBO_BASE.to_string()));
        pairs
    }
}

impl PrefixMapProvider for BuiltinPrefixMaps {
    fn load_one(&self, name: &str) -> Result<Vec<(String, String)>> {
        match name {
            "semweb" => Ok(Self::semweb()),
            "obo" => Ok(Self::obo()),
            "merged" => {
                let mut pairs = Self::semweb();
                pairs.extend(Self::obo());
                Ok(pairs)
            }
            other if other.ends_with(".json") || other.ends_with(".toml") => {
                load_prefix_file(Path::new(other))
            }
            other => Err(Error::Configuration(format!(
                "unknown named prefix map '{}' (expected one of {:?} or a .json/.toml file)",
                other,
                Self::NAMES
            ))),
        }
    }
}

/// Read a flat prefix map from a JSON or TOML file.
///
/// JSON files may wrap the map in a JSON-LD `@context`; values may then be
/// `{"@id": ...}` objects. Non-string entries are ignored.
pub fn load_prefix_file(path: &Path) -> Result<Vec<(String, String)>> {
    let contents = std::fs::read_to_string(path)?;
    let is_toml = path.extension().and_then(|e| e.to_str()) == Some("toml");

    let value: serde_json::Value = if is_toml {
        let table: toml::Table = toml::from_str(&contents).map_err(|e| {
            Error::Configuration(format!("invalid prefix map {}: {}", path.display(), e))
        })?;
        serde_json::to_value(table).map_err(|e| {
            Error::Configuration(format!("invalid prefix map {}: {}", path.display(), e))
        })?
    } else {
        serde_json::from_str(&contents).map_err(|e| {
            Error::Configuration(format!("invalid prefix map {}: {}", path.display(), e))
        })?
    };

    let map = value
        .get("@context")
        .or_else(|| value.get("prefixes"))
        .unwrap_or(&value)
        .as_object()
        .ok_or_else(|| {
            Error::Configuration(format!("prefix map {} is not an object", path.display()))
        })?;

    Ok(map
        .iter()
        .filter_map(|(prefix, ns)| {
            let ns = ns
                .as_str()
                .or_else(|| ns.get("@id").and_then(|id| id.as_str()))?;
            Some((prefix.clone(), ns.to_string()))
        })
        .collect())
}
