use crate::{emit_success, LoadArgs, OutputMode, PrefixArgs};
use owo_colors::OwoColorize;
use rdf_sql_bulkloader::config::{ensure_db_dir, LoaderConfig};
use rdf_sql_bulkloader::ui::{self, stats_table, Icons, ProgressManager};
use rdf_sql_bulkloader::{BulkLoader, LoadContext, SqliteStore};
use std::path::{Path, PathBuf};

/// Expand glob patterns; plain paths pass through untouched
fn expand_inputs(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[']) {
            files.push(PathBuf::from(pattern));
            continue;
        }
        let mut matched = glob::glob(pattern)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|p| p.is_file())
            .peekable();
        if matched.peek().is_none() {
            anyhow::bail!("no input files match '{}'", pattern);
        }
        files.extend(matched);
    }
    Ok(files)
}

pub fn run_load(output_mode: OutputMode, mut config: LoaderConfig, args: &LoadArgs) -> anyhow::Result<()> {
    args.apply(&mut config);
    let files = expand_inputs(&args.files)?;
    ensure_db_dir(&args.output)?;

    let mut loader = BulkLoader::new(config)?;

    if output_mode.is_human() {
        ui::header(&format!("Loading {} file(s)", files.len()));
        ui::info("Database", &args.output.display().to_string());
        ui::info("Prefixes", &loader.registry().len().to_string());
    }

    let (mut progress, tx) = ProgressManager::new(files.len());
    let span = tracing::info_span!("bulkload", target = %args.output.display());
    let ctx = LoadContext::new(span).with_progress(tx);

    let result = loader.load_sqlite(&args.output, &files, &ctx);
    drop(ctx);

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            progress.join();
            if output_mode.is_human() {
                ui::error(&format!("Load failed: {}", e));
            }
            return Err(e.into());
        }
    };

    if output_mode.is_human() {
        progress.finish_with_summary(report.elapsed, report.files, report.rows);
        let mut stats = vec![
            ("Files", report.files.to_string()),
            ("Rows", report.rows.to_string()),
            ("Chunks", report.chunks.to_string()),
            ("Prefixes written", report.prefixes_written.to_string()),
            ("SHACL prefixes", report.prefixes_discovered.to_string()),
            ("Cached contractions", report.cache_entries.to_string()),
        ];
        if loader.config().rdftab_compatibility {
            stats.push(("Mirrored rows", report.mirrored_rows.to_string()));
        }
        println!("{}", stats_table(&stats));
        if report.blank_node_collision_risk {
            ui::warn("Blank nodes from different files share one namespace (use --scope-blank-nodes to separate them)");
        }
        ui::success(&format!("Database saved to {}", args.output.display()));
    } else {
        progress.join();
        emit_success(output_mode, "load-sqlite", serde_json::to_value(&report)?)?;
    }
    Ok(())
}

pub fn run_prefixes(output_mode: OutputMode, mut config: LoaderConfig, args: &PrefixArgs) -> anyhow::Result<()> {
    args.apply(&mut config);
    config.require_prefixes = false;
    let loader = BulkLoader::new(config)?;
    let entries = loader.registry().entries();

    if output_mode.is_human() {
        ui::section(&format!("{} prefixes", entries.len()));
        for (prefix, namespace) in entries {
            println!("  {} {}", prefix.bold(), namespace);
        }
    } else {
        let data: serde_json::Map<String, serde_json::Value> = entries
            .iter()
            .map(|(p, ns)| (p.clone(), serde_json::Value::String(ns.clone())))
            .collect();
        emit_success(output_mode, "prefixes", serde_json::Value::Object(data))?;
    }
    Ok(())
}

pub fn run_stats(output_mode: OutputMode, database: &Path) -> anyhow::Result<()> {
    if !database.exists() {
        anyhow::bail!("database not found: {}", database.display());
    }
    let store = SqliteStore::open(database)?;
    let stats = store.stats()?;

    if output_mode.is_human() {
        println!("{} {}", Icons::STATS, database.display());
        println!("{}", stats);
    } else {
        emit_success(output_mode, "stats", serde_json::to_value(stats)?)?;
    }
    Ok(())
}

pub fn run_version(output_mode: OutputMode) -> anyhow::Result<()> {
    if output_mode.is_human() {
        println!(
            "{} {}",
            "rdf-sql-bulkloader".bold(),
            env!("CARGO_PKG_VERSION")
        );
    } else {
        let data = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
        });
        emit_success(output_mode, "version", data)?;
    }
    Ok(())
}
