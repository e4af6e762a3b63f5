//! rdf-sql-bulkloader CLI - load RDF files into SQLite statement tables

mod commands;

use clap::{ArgAction, Args, Parser, Subcommand};
use rdf_sql_bulkloader::config::{load_config, LoaderConfig};
use rdf_sql_bulkloader::ScanStrategy;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "rdf-sql-bulkloader")]
#[command(version)]
#[command(about = "Bulk load RDF graphs into SQLite statement tables")]
#[command(long_about = r#"
Loads RDF files into SQLite so triples can be queried with SQL:
  • IRIs contracted to CURIEs using named and explicit prefix maps
  • In-data SHACL sh:prefix/sh:namespace declarations honoured
  • Literals split into value, datatype and language columns
  • Optional rdftab-compatible `statements` table

Example usage:
  rdf-sql-bulkloader load-sqlite -o go.db go.owl
  rdf-sql-bulkloader load-sqlite -o data.db -m text/turtle 'data/*.ttl'
  rdf-sql-bulkloader stats -d go.db
"#)]
struct Cli {
    /// Increase logging verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors and suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    json: bool,

    /// Loader configuration file (TOML); defaults to ./bulkloader.toml if present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load RDF files into a SQLite database
    LoadSqlite(LoadArgs),

    /// Show the prefix map that would be used for contraction
    Prefixes(PrefixArgs),

    /// Show row counts of a loaded database
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
pub struct PrefixArgs {
    /// Named prefix map (built-in name or .json/.toml file); repeatable
    #[arg(short = 'n', long = "named-prefix-map")]
    pub named_prefix_maps: Vec<String>,

    /// Explicit prefix as PREFIX=NAMESPACE; repeatable, highest precedence
    #[arg(short = 'p', long = "prefix", value_parser = parse_prefix)]
    pub prefixes: Vec<(String, String)>,
}

impl PrefixArgs {
    pub fn apply(&self, config: &mut LoaderConfig) {
        if !self.named_prefix_maps.is_empty() {
            config.named_prefix_maps = self.named_prefix_maps.clone();
        }
        for (prefix, namespace) in &self.prefixes {
            config.prefix_map.insert(prefix.clone(), namespace.clone());
        }
    }
}

#[derive(Args)]
pub struct LoadArgs {
    /// Input RDF files (glob patterns are expanded)
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Output database path
    #[arg(short, long)]
    pub output: PathBuf,

    /// Recreate the database if it already exists
    #[arg(long)]
    pub force: bool,

    /// Add rows to an existing database
    #[arg(long, conflicts_with = "force")]
    pub append: bool,

    /// Do not issue CREATE TABLE statements
    #[arg(long)]
    pub no_create_tables: bool,

    /// Media type of the inputs (default application/rdf+xml)
    #[arg(short, long)]
    pub mime_type: Option<String>,

    #[command(flatten)]
    pub prefix_args: PrefixArgs,

    /// Skip the SHACL prefix discovery pass
    #[arg(long)]
    pub no_shacl: bool,

    /// Do not create the rdftab-compatible `statements` table
    #[arg(long)]
    pub no_rdftab: bool,

    /// Rows per insert batch
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Add a `graph` column
    #[arg(long)]
    pub include_graph_name: bool,

    /// Use each file's owl:Ontology IRI as its graph name
    #[arg(long, requires = "include_graph_name")]
    pub graph_name_from_ontology: bool,

    /// Add an `id` column
    #[arg(long)]
    pub include_statement_id: bool,

    /// Create lookup indexes after loading
    #[arg(long)]
    pub index: bool,

    /// Namespace blank nodes per input file
    #[arg(long)]
    pub scope_blank_nodes: bool,

    /// Store xsd:string / rdf:langString datatypes for plain and tagged literals
    #[arg(long)]
    pub explicit_string_datatype: bool,

    /// Parse each file once and keep its triples in memory for both passes
    #[arg(long)]
    pub buffer: bool,

    /// Normalize on a worker thread while writing
    #[arg(long)]
    pub pipelined: bool,
}

impl LoadArgs {
    /// Overlay command-line flags on a base configuration
    pub fn apply(&self, config: &mut LoaderConfig) {
        config.force |= self.force;
        config.append |= self.append;
        config.create_tables &= !self.no_create_tables;
        config.use_shacl_namespaces &= !self.no_shacl;
        config.rdftab_compatibility &= !self.no_rdftab;
        config.include_graph_name |= self.include_graph_name;
        config.graph_name_from_ontology |= self.graph_name_from_ontology;
        config.include_statement_id |= self.include_statement_id;
        config.index_statements |= self.index;
        config.scope_blank_nodes_per_file |= self.scope_blank_nodes;
        config.explicit_string_datatype |= self.explicit_string_datatype;
        config.pipelined |= self.pipelined;
        if self.buffer {
            config.scan_strategy = ScanStrategy::Buffer;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(mime) = &self.mime_type {
            config.mime_type = Some(mime.clone());
        }
        self.prefix_args.apply(config);
    }
}

fn parse_prefix(s: &str) -> Result<(String, String), String> {
    let (prefix, namespace) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PREFIX=NAMESPACE, got '{}'", s))?;
    if prefix.is_empty() || namespace.is_empty() {
        return Err(format!("expected PREFIX=NAMESPACE, got '{}'", s));
    }
    Ok((prefix.to_string(), namespace.to_string()))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

/// Print a JSON success envelope
pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "ok": true,
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over the flags
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };
    rdf_sql_bulkloader::output::set_quiet(cli.quiet || cli.json);

    let base_config = load_config(cli.config.as_deref())?.unwrap_or_default();

    let result = match cli.command {
        Commands::LoadSqlite(args) => commands::run_load(output_mode, base_config, &args),
        Commands::Prefixes(args) => commands::run_prefixes(output_mode, base_config, &args),
        Commands::Stats { database } => commands::run_stats(output_mode, &database),
        Commands::Version => commands::run_version(output_mode),
    };

    if let Err(e) = &result {
        if output_mode == OutputMode::Json {
            let envelope = serde_json::json!({ "ok": false, "error": e.to_string() });
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
    }
    result
}
