//! Batch Loader
//!
//! Drives a load session through its states:
//!
//! ```text
//! Init -> [PrefixScan] -> NormalizeWrite -> Commit -> Done
//!   \__________\______________\______________\____-> Failed
//! ```
//!
//! Everything from the DDL to the last statement row is written inside one
//! transaction, committed once. Any failure rolls it back.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam::channel::Sender;
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn, Span};

use crate::chunk::try_chunks;
use crate::config::{prepare_target, LoaderConfig, TargetPlan};
use crate::node::{Node, Triple};
use crate::normalize::NodeNormalizer;
use crate::prefix::{BuiltinPrefixMaps, PrefixMapProvider, PrefixRegistry, ShaclPrefixScanner};
use crate::source::{FileSource, TripleSource};
use crate::storage::{schema, SqliteStore, StatementLayout, StatementRow};
use crate::ui::{ProgressMessage, ProgressPhase};
use crate::{Error, Result};

const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
const OWL_ONTOLOGY: &str = "http://www.w3.org/2002/07/owl#Ontology";

/// Chunks in flight between the normalizer thread and the writer
const PIPELINE_DEPTH: usize = 2;

/// Where a load session currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoadState {
    Init,
    PrefixScan,
    NormalizeWrite,
    Commit,
    Done,
    Failed,
}

/// Shared flag for best-effort cancellation of a running load
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Per-invocation logging and control context.
///
/// Log output is attached to `span`; progress is sent to `progress` when a
/// listener is attached.
#[derive(Debug, Clone)]
pub struct LoadContext {
    pub span: Span,
    pub progress: Option<Sender<ProgressMessage>>,
    pub cancel: CancelFlag,
}

impl Default for LoadContext {
    fn default() -> Self {
        Self::new(info_span!("bulkload"))
    }
}

impl LoadContext {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            progress: None,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_progress(mut self, tx: Sender<ProgressMessage>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    fn report(&self, msg: ProgressMessage) {
        if let Some(tx) = &self.progress {
            // A listener that went away is not an error for the load
            let _ = tx.send(msg);
        }
    }
}

/// Summary of a completed load
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub files: usize,
    pub rows: usize,
    pub chunks: usize,
    pub prefixes_discovered: usize,
    pub prefixes_written: usize,
    pub mirrored_rows: usize,
    /// Several files shared one blank node namespace
    pub blank_node_collision_risk: bool,
    pub cache_entries: usize,
    pub cache_hits: u64,
    pub elapsed: Duration,
}

/// Loads RDF sources into SQLite statement tables.
pub struct BulkLoader {
    config: LoaderConfig,
    base_registry: PrefixRegistry,
    session_registry: Option<PrefixRegistry>,
    state: LoadState,
}

impl BulkLoader {
    /// Create a loader using the built-in named prefix maps
    pub fn new(config: LoaderConfig) -> Result<Self> {
        Self::with_provider(config, &BuiltinPrefixMaps)
    }

    /// Create a loader resolving named prefix maps through `provider`
    pub fn with_provider(config: LoaderConfig, provider: &dyn PrefixMapProvider) -> Result<Self> {
        config.validate()?;
        let base_registry = PrefixRegistry::build(
            &config.prefix_map,
            &config.named_prefix_maps,
            provider,
            config.require_prefixes,
        )?;
        Ok(Self {
            config,
            base_registry,
            session_registry: None,
            state: LoadState::Init,
        })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Registry built from the configured maps, before any SHACL discovery
    pub fn registry(&self) -> &PrefixRegistry {
        &self.base_registry
    }

    /// Final registry of the most recent session, including discoveries
    pub fn session_registry(&self) -> Option<&PrefixRegistry> {
        self.session_registry.as_ref()
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    fn layout(&self) -> StatementLayout {
        StatementLayout::new(self.config.include_statement_id, self.config.include_graph_name)
    }

    fn transition(&mut self, next: LoadState) {
        debug!(from = ?self.state, to = ?next, "load state");
        self.state = next;
    }

    /// Open input files as sources, applying the configured scan strategy
    pub fn open_sources(&self, files: &[PathBuf]) -> Result<Vec<Box<dyn TripleSource>>> {
        files
            .iter()
            .map(|path| {
                if !path.is_file() {
                    return Err(Error::Configuration(format!(
                        "input file not found: {}",
                        path.display()
                    )));
                }
                let source = FileSource::new(path, self.config.mime_type.as_deref())?;
                self.config.scan_strategy.prepare(Box::new(source))
            })
            .collect()
    }

    /// Load files into the SQLite database at `target`.
    ///
    /// Inputs and the target are checked before anything is written. On
    /// failure the target is left as it was: a new file is removed, an
    /// appended one is rolled back and a forced replacement never reaches it.
    pub fn load_sqlite(&mut self, target: &Path, files: &[PathBuf], ctx: &LoadContext) -> Result<LoadReport> {
        let plan = prepare_target(target, &self.config)?;
        let sources = self.open_sources(files)?;

        match plan {
            TargetPlan::Append => self.load_into_path(target, sources, ctx),
            TargetPlan::Create => {
                let result = self.load_into_path(target, sources, ctx);
                if result.is_err() && target.exists() {
                    debug!(target = %target.display(), "removing target after failed load");
                    std::fs::remove_file(target)?;
                }
                result
            }
            TargetPlan::Replace => {
                let dir = match target.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent,
                    _ => Path::new("."),
                };
                // Dropped (and deleted) on any error below
                let staging = tempfile::Builder::new()
                    .prefix(".bulkload-")
                    .suffix(".db")
                    .tempfile_in(dir)?;
                let report = self.load_into_path(staging.path(), sources, ctx)?;
                staging.persist(target).map_err(|e| Error::Io(e.error))?;
                debug!(target = %target.display(), "replaced target");
                Ok(report)
            }
        }
    }

    fn load_into_path(
        &mut self,
        target: &Path,
        sources: Vec<Box<dyn TripleSource>>,
        ctx: &LoadContext,
    ) -> Result<LoadReport> {
        let mut store = SqliteStore::open(target)?;
        self.bulkload(&mut store, &sources, ctx)
    }

    /// Load sources into an open store as a single transaction.
    pub fn bulkload(
        &mut self,
        store: &mut SqliteStore,
        sources: &[Box<dyn TripleSource>],
        ctx: &LoadContext,
    ) -> Result<LoadReport> {
        let _enter = ctx.span.enter();
        let started = Instant::now();
        self.state = LoadState::Init;

        match self.run(store, sources, ctx) {
            Ok(mut report) => {
                self.transition(LoadState::Done);
                report.elapsed = started.elapsed();
                info!(
                    files = report.files,
                    rows = report.rows,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "load complete"
                );
                Ok(report)
            }
            Err(e) => {
                self.transition(LoadState::Failed);
                error!("load failed: {}", e);
                if store.in_transaction() {
                    if let Err(rollback_err) = store.rollback() {
                        warn!("rollback failed: {}", rollback_err);
                    }
                }
                Err(e)
            }
        }
    }

    fn run(
        &mut self,
        store: &mut SqliteStore,
        sources: &[Box<dyn TripleSource>],
        ctx: &LoadContext,
    ) -> Result<LoadReport> {
        let mut report = LoadReport {
            files: sources.len(),
            ..Default::default()
        };
        let layout = self.layout();
        let rdftab = self.config.rdftab_compatibility;

        // Init
        ctx.cancel.check()?;
        store.begin_transaction()?;
        if self.config.issues_ddl() {
            for ddl in schema::all_schema_statements(&layout, rdftab) {
                store.execute_ddl(&ddl)?;
            }
        }
        let mirror_mark = if rdftab { store.max_statement_rowid()? } else { 0 };

        // PrefixScan
        let mut registry = self.base_registry.clone();
        let mut graph_names: Vec<Option<String>> = vec![None; sources.len()];
        if self.config.use_shacl_namespaces || self.config.graph_name_from_ontology {
            self.transition(LoadState::PrefixScan);
            report.prefixes_discovered = self.first_pass(sources, &mut registry, &mut graph_names, ctx)?;
        }
        report.prefixes_written = store.insert_prefixes(registry.entries())?;

        // NormalizeWrite
        self.transition(LoadState::NormalizeWrite);
        if sources.len() > 1 && !self.config.scope_blank_nodes_per_file {
            let msg = format!(
                "loading {} files into one blank node namespace; same-named blank nodes in different files will be merged",
                sources.len()
            );
            warn!("{}", msg);
            ctx.report(ProgressMessage::Warning(msg));
            report.blank_node_collision_risk = true;
        }

        let mut normalizer = NodeNormalizer::new(&registry)
            .with_explicit_string_datatype(self.config.explicit_string_datatype);
        ctx.report(ProgressMessage::Started {
            phase: ProgressPhase::Loading,
            total: sources.len(),
        });
        for (file_idx, source) in sources.iter().enumerate() {
            ctx.cancel.check()?;
            if self.config.scope_blank_nodes_per_file {
                normalizer.set_blank_node_scope(Some(format!("f{}", file_idx)));
            }
            let file_graph = graph_names[file_idx]
                .as_deref()
                .map(|iri| normalizer.contract(iri));
            let job = FileJob {
                source: source.as_ref(),
                file_idx,
                file_graph,
                include_id: self.config.include_statement_id,
                include_graph: self.config.include_graph_name,
                batch_size: self.config.batch_size,
            };

            let (rows, chunks) = if self.config.pipelined {
                write_pipelined(store, &layout, &mut normalizer, job, ctx, report.rows)?
            } else {
                write_sequential(store, &layout, &mut normalizer, job, ctx, report.rows)?
            };
            info!(file = %source.name(), rows, chunks, "loaded file");
            report.rows += rows;
            report.chunks += chunks;
        }
        ctx.report(ProgressMessage::Finished {
            phase: ProgressPhase::Loading,
        });
        report.cache_entries = normalizer.cache().len();
        report.cache_hits = normalizer.cache().hits();
        drop(normalizer);

        // Commit
        self.transition(LoadState::Commit);
        ctx.cancel.check()?;
        ctx.report(ProgressMessage::Started {
            phase: ProgressPhase::Finalizing,
            total: 1,
        });
        if rdftab {
            report.mirrored_rows = store.copy_to_rdftab(mirror_mark)?;
            debug!(rows = report.mirrored_rows, "materialized statements mirror");
        }
        if self.config.index_statements {
            store.create_indexes(rdftab)?;
        }
        store.commit()?;
        ctx.report(ProgressMessage::Finished {
            phase: ProgressPhase::Finalizing,
        });

        self.session_registry = Some(registry);
        Ok(report)
    }

    /// Scan every source once before anything is normalized, so a prefix
    /// declared in a later file still applies to earlier ones.
    fn first_pass(
        &self,
        sources: &[Box<dyn TripleSource>],
        registry: &mut PrefixRegistry,
        graph_names: &mut [Option<String>],
        ctx: &LoadContext,
    ) -> Result<usize> {
        let use_shacl = self.config.use_shacl_namespaces;
        let want_ontology = self.config.graph_name_from_ontology;

        ctx.report(ProgressMessage::Started {
            phase: ProgressPhase::Scanning,
            total: sources.len(),
        });
        let mut discovered = 0;
        for (idx, source) in sources.iter().enumerate() {
            // Blank subjects only identify a declaration within one document
            let mut scanner = ShaclPrefixScanner::new();
            for triple in source.triples()? {
                ctx.cancel.check()?;
                let triple = triple?;
                if use_shacl {
                    scanner.observe(&triple);
                }
                if want_ontology && graph_names[idx].is_none() {
                    graph_names[idx] = ontology_iri(&triple);
                }
            }
            for (prefix, namespace) in scanner.finish() {
                if registry.merge(&prefix, &namespace) {
                    debug!(prefix = %prefix, namespace = %namespace, file = %source.name(), "registered SHACL prefix");
                    discovered += 1;
                } else {
                    debug!(prefix = %prefix, "SHACL prefix already registered; keeping first");
                }
            }
            ctx.report(ProgressMessage::Progress {
                phase: ProgressPhase::Scanning,
                current: idx + 1,
                file: Some(source.name().to_string()),
            });
        }
        ctx.report(ProgressMessage::Finished {
            phase: ProgressPhase::Scanning,
        });

        Ok(discovered)
    }
}

fn ontology_iri(triple: &Triple) -> Option<String> {
    match (&triple.subject, triple.predicate.as_iri(), triple.object.as_iri()) {
        (Node::Iri(subject), Some(RDF_TYPE), Some(OWL_ONTOLOGY)) => Some(subject.clone()),
        _ => None,
    }
}

/// One file's worth of normalization settings
struct FileJob<'a> {
    source: &'a dyn TripleSource,
    file_idx: usize,
    file_graph: Option<String>,
    include_id: bool,
    include_graph: bool,
    batch_size: usize,
}

/// Normalized rows of one file, in source order
fn file_rows<'a>(
    normalizer: &'a mut NodeNormalizer<'_>,
    job: &'a FileJob<'a>,
    cancel: &'a CancelFlag,
) -> Result<impl Iterator<Item = Result<StatementRow>> + 'a> {
    let triples = job.source.triples()?;
    Ok(triples.enumerate().map(move |(n, triple)| {
        cancel.check()?;
        let triple = triple?;
        let mut row = normalizer.normalize_triple(&triple)?;
        if job.include_id {
            row.id = Some(format!("{}:{}", job.file_idx, n));
        }
        if job.include_graph {
            row.graph = match &triple.graph {
                Some(graph) => Some(normalizer.contract(graph)),
                None => job.file_graph.clone(),
            };
        }
        Ok(row)
    }))
}

fn flush(
    store: &SqliteStore,
    layout: &StatementLayout,
    chunk: &[StatementRow],
    job: &FileJob<'_>,
    ctx: &LoadContext,
    total_before: usize,
) -> Result<usize> {
    ctx.cancel.check()?;
    let written = store.insert_statements(layout, chunk)?;
    if let Some(first) = chunk.first() {
        info!(rows = written, first = ?first.subject, "inserted chunk");
    }
    ctx.report(ProgressMessage::Progress {
        phase: ProgressPhase::Loading,
        current: total_before + written,
        file: Some(job.source.name().to_string()),
    });
    Ok(written)
}

fn write_sequential(
    store: &SqliteStore,
    layout: &StatementLayout,
    normalizer: &mut NodeNormalizer<'_>,
    job: FileJob<'_>,
    ctx: &LoadContext,
    total_before: usize,
) -> Result<(usize, usize)> {
    let mut rows = 0;
    let mut chunks = 0;
    for chunk in try_chunks(file_rows(normalizer, &job, &ctx.cancel)?, job.batch_size) {
        let chunk = chunk?;
        rows += flush(store, layout, &chunk, &job, ctx, total_before + rows)?;
        chunks += 1;
    }
    Ok((rows, chunks))
}

/// Normalize on a scoped worker thread while this thread writes.
///
/// Chunks travel over a bounded channel and are written in the order they
/// were produced. If writing fails the receiver is dropped, which stops the
/// worker at its next send.
fn write_pipelined(
    store: &SqliteStore,
    layout: &StatementLayout,
    normalizer: &mut NodeNormalizer<'_>,
    job: FileJob<'_>,
    ctx: &LoadContext,
    total_before: usize,
) -> Result<(usize, usize)> {
    let (tx, rx) = crossbeam::channel::bounded::<Result<Vec<StatementRow>>>(PIPELINE_DEPTH);
    let span = ctx.span.clone();
    let cancel = ctx.cancel.clone();
    let job_ref = &job;

    let outcome = crossbeam::thread::scope(|scope| {
        scope.spawn(move |_| {
            span.in_scope(|| {
                let rows = match file_rows(normalizer, job_ref, &cancel) {
                    Ok(rows) => rows,
                    Err(e) => {
                        let _ = tx.send(Err(e));
                        return;
                    }
                };
                for chunk in try_chunks(rows, job_ref.batch_size) {
                    if tx.send(chunk).is_err() {
                        break;
                    }
                }
            })
        });

        let mut rows = 0;
        let mut chunks = 0;
        let mut result = Ok(());
        for chunk in rx.iter() {
            let written = chunk.and_then(|chunk| flush(store, layout, &chunk, job_ref, ctx, total_before + rows));
            match written {
                Ok(n) => {
                    rows += n;
                    chunks += 1;
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        drop(rx);
        result.map(|()| (rows, chunks))
    });

    outcome.unwrap_or_else(|panic| std::panic::resume_unwind(panic))
}
