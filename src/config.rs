use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::chunk::DEFAULT_BATCH_SIZE;
use crate::source::ScanStrategy;
use crate::{Error, Result};

fn default_true() -> bool {
    true
}

fn default_named_prefix_maps() -> Vec<String> {
    vec!["merged".to_string()]
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

/// Options controlling a load session.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Recreate the target if it already exists
    pub force: bool,
    /// Add rows to an existing target without issuing DDL
    pub append: bool,
    /// Issue DDL; turn off when the schema is managed externally
    #[serde(default = "default_true")]
    pub create_tables: bool,
    /// Also materialize the `statements` table with a `stanza` column
    #[serde(default = "default_true")]
    pub rdftab_compatibility: bool,
    /// Run the SHACL prefix discovery pass before loading
    #[serde(default = "default_true")]
    pub use_shacl_namespaces: bool,
    /// Named prefix maps, merged left to right
    #[serde(default = "default_named_prefix_maps")]
    pub named_prefix_maps: Vec<String>,
    /// Explicit prefixes; take precedence over everything else
    pub prefix_map: BTreeMap<String, String>,
    /// Rows per insert batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    pub include_graph_name: bool,
    pub include_statement_id: bool,
    /// Use each file's `owl:Ontology` IRI as its graph name
    pub graph_name_from_ontology: bool,
    /// Create lookup indexes after loading
    pub index_statements: bool,
    /// Namespace blank nodes per input file
    pub scope_blank_nodes_per_file: bool,
    /// Store `xsd:string` / `rdf:langString` for plain and tagged literals
    pub explicit_string_datatype: bool,
    pub scan_strategy: ScanStrategy,
    /// Normalize on a worker thread while the previous chunk is written
    pub pipelined: bool,
    /// Fail when the prefix map ends up empty
    #[serde(default = "default_true")]
    pub require_prefixes: bool,
    /// Media type of the input files (RDF/XML when unset)
    pub mime_type: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            force: false,
            append: false,
            create_tables: true,
            rdftab_compatibility: true,
            use_shacl_namespaces: true,
            named_prefix_maps: default_named_prefix_maps(),
            prefix_map: BTreeMap::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            include_graph_name: false,
            include_statement_id: false,
            graph_name_from_ontology: false,
            index_statements: false,
            scope_blank_nodes_per_file: false,
            explicit_string_datatype: false,
            scan_strategy: ScanStrategy::Reparse,
            pipelined: false,
            require_prefixes: true,
            mime_type: None,
        }
    }
}

impl LoaderConfig {
    /// Reject option combinations that can never succeed
    pub fn validate(&self) -> Result<()> {
        if self.force && self.append {
            return Err(Error::Configuration(
                "force and append are mutually exclusive".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::Configuration("batch_size must be at least 1".to_string()));
        }
        if self.graph_name_from_ontology && !self.include_graph_name {
            return Err(Error::Configuration(
                "graph_name_from_ontology requires include_graph_name".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether DDL should be issued for this session
    pub fn issues_ddl(&self) -> bool {
        self.create_tables && !self.append
    }
}

/// How a load session writes to its output path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPlan {
    /// The path does not exist yet; it is removed again if the load fails
    Create,
    /// `force` over an existing file; the load goes to a sibling temp file
    /// that replaces the target only after commit
    Replace,
    /// Add rows to the existing file inside one transaction
    Append,
}

/// Check the output path against force/append.
///
/// Nothing on disk is touched here; an existing target stays as it is
/// until a replacement load has committed.
pub fn prepare_target(path: &Path, config: &LoaderConfig) -> Result<TargetPlan> {
    config.validate()?;
    let exists = path.exists();
    if config.append {
        if !exists {
            return Err(Error::Configuration(format!(
                "cannot append: {} does not exist",
                path.display()
            )));
        }
        return Ok(TargetPlan::Append);
    }
    if exists {
        if !config.force {
            return Err(Error::Configuration(format!(
                "path exists: {} (use force to overwrite or append to add rows)",
                path.display()
            )));
        }
        return Ok(TargetPlan::Replace);
    }
    Ok(TargetPlan::Create)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("bulkloader.toml")
}

/// Load a config file; `None` when no path is given and the default file is absent
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<LoaderConfig>> {
    let explicit = path.is_some();
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        if explicit {
            anyhow::bail!("config file not found: {}", path.display());
        }
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: LoaderConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
