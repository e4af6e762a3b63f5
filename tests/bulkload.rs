use rdf_sql_bulkloader::{BulkLoader, Error, LoadContext, LoadReport, LoaderConfig, ScanStrategy};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

type Row = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
);

const TURTLE: &str = "text/turtle";

fn data(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

fn turtle_config() -> LoaderConfig {
    LoaderConfig {
        mime_type: Some(TURTLE.to_string()),
        ..Default::default()
    }
}

fn load(target: &Path, files: &[&str], config: LoaderConfig) -> rdf_sql_bulkloader::Result<LoadReport> {
    let files: Vec<PathBuf> = files.iter().map(|f| data(f)).collect();
    let mut loader = BulkLoader::new(config)?;
    loader.load_sqlite(target, &files, &LoadContext::default())
}

fn rows(db: &Path) -> Vec<Row> {
    let conn = Connection::open(db).unwrap();
    let mut stmt = conn
        .prepare("SELECT subject, predicate, object, value, datatype, language FROM statement")
        .unwrap();
    let mut rows: Vec<Row> = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?, r.get(5)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    rows.sort();
    rows
}

/// Blank node labels from anonymous nodes change between parses
fn masked(rows: Vec<Row>) -> Vec<Row> {
    let mask = |s: String| if s.starts_with("_:") { "_:".to_string() } else { s };
    let mut rows: Vec<Row> = rows
        .into_iter()
        .map(|(s, p, o, v, d, l)| (mask(s), p, o.map(mask), v, d, l))
        .collect();
    rows.sort();
    rows
}

fn count(db: &Path, sql: &str) -> i64 {
    let conn = Connection::open(db).unwrap();
    conn.query_row(sql, [], |r| r.get(0)).unwrap()
}

fn find<'a>(rows: &'a [Row], subject: &str, predicate: &str) -> Vec<&'a Row> {
    rows.iter()
        .filter(|r| r.0 == subject && r.1 == predicate)
        .collect()
}

#[test]
fn test_rdfxml_relation_to_taxon() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("go.db");
    let report = load(&db, &["go_nucleus.owl"], LoaderConfig::default()).unwrap();

    let rows = rows(&db);
    assert_eq!(report.rows, rows.len());
    let relation = find(&rows, "GO:0005634", "RO:0002161");
    assert_eq!(relation.len(), 1);
    assert_eq!(
        relation[0],
        &(
            "GO:0005634".to_string(),
            "RO:0002161".to_string(),
            Some("NCBITaxon:2".to_string()),
            None,
            None,
            None
        )
    );

    let restriction: Vec<_> = rows
        .iter()
        .filter(|r| r.1 == "owl:someValuesFrom")
        .collect();
    assert_eq!(restriction.len(), 1);
    assert!(restriction[0].0.starts_with("_:"));
    assert_eq!(restriction[0].2.as_deref(), Some("NCBITaxon:2"));
}

#[test]
fn test_rdfxml_literal_columns() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("go.db");
    load(&db, &["go_nucleus.owl"], LoaderConfig::default()).unwrap();
    let rows = rows(&db);

    let label = find(&rows, "GO:0005634", "rdfs:label");
    assert_eq!(label[0].3.as_deref(), Some("nucleus"));
    assert_eq!(label[0].4, None);
    assert_eq!(label[0].5.as_deref(), Some("en"));

    let definition = find(&rows, "GO:0005634", "IAO:0000115");
    assert!(definition[0].3.as_deref().unwrap().starts_with("A membrane-bounded organelle"));
    assert_eq!(definition[0].4, None);

    let namespace = find(&rows, "GO:0005634", "oboInOwl:hasOBONamespace");
    assert_eq!(namespace[0].3.as_deref(), Some("cellular_component"));
    assert_eq!(namespace[0].4, None);

    let created = find(&rows, "GO:0005634", "oboInOwl:creation_date");
    assert_eq!(created[0].4.as_deref(), Some("xsd:dateTime"));
    assert_eq!(created[0].5, None);
}

#[test]
fn test_object_or_value_never_both() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("go.db");
    load(&db, &["go_nucleus.owl"], LoaderConfig::default()).unwrap();

    let bad = count(
        &db,
        "SELECT COUNT(*) FROM statement WHERE (object IS NULL) = (value IS NULL)",
    );
    assert_eq!(bad, 0);
    let typed_without_value = count(
        &db,
        "SELECT COUNT(*) FROM statement WHERE value IS NULL AND (datatype IS NOT NULL OR language IS NOT NULL)",
    );
    assert_eq!(typed_without_value, 0);
}

#[test]
fn test_shacl_prefix_contracts_document() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("shacl.db");
    let config = LoaderConfig {
        named_prefix_maps: vec!["semweb".to_string()],
        ..turtle_config()
    };
    let report = load(&db, &["fake_go.ttl"], config).unwrap();
    assert_eq!(report.prefixes_discovered, 1);

    let rows = rows(&db);
    assert_eq!(find(&rows, "FAKE_GO:0005634", "rdfs:subClassOf")[0].2.as_deref(), Some("FAKE_GO:0043231"));
    let uncontracted = count(
        &db,
        "SELECT COUNT(*) FROM statement WHERE subject LIKE 'http://purl.obolibrary.org/obo/GO_%' OR object LIKE 'http://purl.obolibrary.org/obo/GO_%'",
    );
    assert_eq!(uncontracted, 0);
    let prefix_rows = count(
        &db,
        "SELECT COUNT(*) FROM prefix WHERE prefix = 'FAKE_GO' AND base = 'http://purl.obolibrary.org/obo/GO_'",
    );
    assert_eq!(prefix_rows, 1);
}

#[test]
fn test_shacl_discovery_disabled() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("shacl.db");
    let config = LoaderConfig {
        named_prefix_maps: vec!["semweb".to_string()],
        use_shacl_namespaces: false,
        ..turtle_config()
    };
    let report = load(&db, &["fake_go.ttl"], config).unwrap();
    assert_eq!(report.prefixes_discovered, 0);
    let rows = rows(&db);
    assert_eq!(find(&rows, "http://purl.obolibrary.org/obo/GO_0005634", "rdfs:label").len(), 1);
}

#[test]
fn test_rdftab_mirror_matches_statement() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("go.db");
    let report = load(&db, &["go_nucleus.owl"], LoaderConfig::default()).unwrap();

    let statement = count(&db, "SELECT COUNT(*) FROM statement");
    let statements = count(&db, "SELECT COUNT(*) FROM statements");
    assert_eq!(statement, statements);
    assert_eq!(report.mirrored_rows as i64, statements);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM statements WHERE stanza IS NOT subject"), 0);
    let unmatched = count(
        &db,
        "SELECT COUNT(*) FROM (SELECT subject, predicate, object, value, datatype, language FROM statement
                               EXCEPT
                               SELECT subject, predicate, object, value, datatype, language FROM statements)",
    );
    assert_eq!(unmatched, 0);
}

#[test]
fn test_rdftab_disabled() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("go.db");
    let config = LoaderConfig {
        rdftab_compatibility: false,
        ..Default::default()
    };
    load(&db, &["go_nucleus.owl"], config).unwrap();
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'statements'"),
        0
    );
}

#[test]
fn test_batch_size_one() {
    let dir = TempDir::new().unwrap();
    let single = dir.path().join("single.db");
    let bulk = dir.path().join("bulk.db");

    let report = load(
        &single,
        &["literals.ttl", "blank_a.ttl"],
        LoaderConfig {
            batch_size: 1,
            ..turtle_config()
        },
    )
    .unwrap();
    assert_eq!(report.chunks, report.rows);
    load(&bulk, &["literals.ttl", "blank_a.ttl"], turtle_config()).unwrap();

    assert_eq!(rows(&single), rows(&bulk));
    assert_eq!(rows(&single).len(), report.rows);
}

#[test]
fn test_literal_shapes() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("lit.db");
    load(&db, &["literals.ttl"], turtle_config()).unwrap();
    let rows = rows(&db);

    let tagged = find(&rows, "http://example.org/thing", "rdfs:label");
    assert_eq!(tagged[0].3.as_deref(), Some("chose"));
    assert_eq!(tagged[0].4, None);
    assert_eq!(tagged[0].5.as_deref(), Some("fr"));

    let plain = find(&rows, "http://example.org/thing", "rdfs:comment");
    assert_eq!(plain[0].3.as_deref(), Some("plain comment"));
    assert_eq!((plain[0].4.as_deref(), plain[0].5.as_deref()), (None, None));

    let typed = find(&rows, "http://example.org/thing", "http://example.org/count");
    assert_eq!(typed[0].3.as_deref(), Some("42"));
    assert_eq!(typed[0].4.as_deref(), Some("xsd:integer"));
    assert_eq!(typed[0].5, None);
}

#[test]
fn test_explicit_string_datatype() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("lit.db");
    let config = LoaderConfig {
        explicit_string_datatype: true,
        ..turtle_config()
    };
    load(&db, &["literals.ttl"], config).unwrap();
    let rows = rows(&db);

    let plain = find(&rows, "http://example.org/thing", "rdfs:comment");
    assert_eq!(plain[0].4.as_deref(), Some("xsd:string"));
    let tagged = find(&rows, "http://example.org/thing", "rdfs:label");
    assert_eq!(tagged[0].4.as_deref(), Some("rdf:langString"));
    assert_eq!(tagged[0].5.as_deref(), Some("fr"));
}

#[test]
fn test_two_clean_runs_identical() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.db");
    let second = dir.path().join("second.db");
    load(&first, &["literals.ttl", "blank_a.ttl"], turtle_config()).unwrap();
    load(&second, &["literals.ttl", "blank_a.ttl"], turtle_config()).unwrap();
    assert_eq!(rows(&first), rows(&second));

    let first = dir.path().join("first_go.db");
    let second = dir.path().join("second_go.db");
    load(&first, &["go_nucleus.owl"], LoaderConfig::default()).unwrap();
    load(&second, &["go_nucleus.owl"], LoaderConfig::default()).unwrap();
    assert_eq!(masked(rows(&first)), masked(rows(&second)));
}

#[test]
fn test_failed_load_removes_new_target() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("broken.db");
    let err = load(&db, &["literals.ttl", "malformed.ttl"], turtle_config()).unwrap_err();
    assert!(matches!(err, Error::Parser { .. }), "unexpected error: {err}");
    assert!(!db.exists());
}

#[test]
fn test_failed_append_keeps_existing_rows() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("existing.db");
    load(&db, &["literals.ttl"], turtle_config()).unwrap();
    let before = rows(&db);

    let config = LoaderConfig {
        append: true,
        ..turtle_config()
    };
    assert!(load(&db, &["malformed.ttl"], config).is_err());
    assert!(db.exists());
    assert_eq!(rows(&db), before);
}

#[test]
fn test_force_and_append_conflict() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("conflict.db");
    let config = LoaderConfig {
        force: true,
        append: true,
        ..turtle_config()
    };
    let err = load(&db, &["literals.ttl"], config).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert!(!db.exists());
}

#[test]
fn test_existing_target_requires_force() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("exists.db");
    load(&db, &["literals.ttl"], turtle_config()).unwrap();

    let err = load(&db, &["blank_a.ttl"], turtle_config()).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));

    let config = LoaderConfig {
        force: true,
        ..turtle_config()
    };
    let report = load(&db, &["blank_a.ttl"], config).unwrap();
    assert_eq!(rows(&db).len(), report.rows);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM statement WHERE subject = 'http://example.org/thing'"), 0);
}

#[test]
fn test_append_adds_rows_and_mirror() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("append.db");
    let first = load(&db, &["literals.ttl"], turtle_config()).unwrap();

    let config = LoaderConfig {
        append: true,
        ..turtle_config()
    };
    let second = load(&db, &["blank_a.ttl"], config).unwrap();
    assert_eq!(second.mirrored_rows, second.rows);

    let total = (first.rows + second.rows) as i64;
    assert_eq!(count(&db, "SELECT COUNT(*) FROM statement"), total);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM statements"), total);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM prefix WHERE prefix = 'rdfs'"), 1);
}

#[test]
fn test_append_requires_existing_target() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("missing.db");
    let config = LoaderConfig {
        append: true,
        ..turtle_config()
    };
    assert!(matches!(load(&db, &["literals.ttl"], config), Err(Error::Configuration(_))));
    assert!(!db.exists());
}

#[test]
fn test_blank_nodes_shared_across_files() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("blank.db");
    let report = load(&db, &["blank_a.ttl", "blank_b.ttl"], turtle_config()).unwrap();
    assert!(report.blank_node_collision_risk);
    assert_eq!(
        count(&db, "SELECT COUNT(DISTINCT subject) FROM statement WHERE predicate = 'http://example.org/name'"),
        1
    );
}

#[test]
fn test_blank_nodes_scoped_per_file() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("blank.db");
    let config = LoaderConfig {
        scope_blank_nodes_per_file: true,
        ..turtle_config()
    };
    let report = load(&db, &["blank_a.ttl", "blank_b.ttl"], config).unwrap();
    assert!(!report.blank_node_collision_risk);
    assert_eq!(
        count(&db, "SELECT COUNT(DISTINCT subject) FROM statement WHERE predicate = 'http://example.org/name'"),
        2
    );
    // each file's reference still points at its own node
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) FROM statement a JOIN statement b ON a.object = b.subject
             WHERE a.predicate = 'http://example.org/points' AND b.predicate = 'http://example.org/name'"
        ),
        2
    );
}

#[test]
fn test_pipelined_matches_sequential() {
    let dir = TempDir::new().unwrap();
    let sequential = dir.path().join("seq.db");
    let pipelined = dir.path().join("pipe.db");
    load(&sequential, &["go_nucleus.owl"], LoaderConfig::default()).unwrap();
    let config = LoaderConfig {
        pipelined: true,
        batch_size: 2,
        ..Default::default()
    };
    load(&pipelined, &["go_nucleus.owl"], config).unwrap();
    assert_eq!(masked(rows(&sequential)), masked(rows(&pipelined)));
}

#[test]
fn test_buffered_matches_reparse() {
    let dir = TempDir::new().unwrap();
    let reparse = dir.path().join("reparse.db");
    let buffered = dir.path().join("buffered.db");
    let config = LoaderConfig {
        named_prefix_maps: vec!["semweb".to_string()],
        ..turtle_config()
    };
    load(&reparse, &["fake_go.ttl", "literals.ttl"], config.clone()).unwrap();
    let report = load(
        &buffered,
        &["fake_go.ttl", "literals.ttl"],
        LoaderConfig {
            scan_strategy: ScanStrategy::Buffer,
            ..config
        },
    )
    .unwrap();
    assert_eq!(report.prefixes_discovered, 1);
    assert_eq!(masked(rows(&reparse)), masked(rows(&buffered)));
}

#[test]
fn test_graph_name_from_ontology() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("graph.db");
    let config = LoaderConfig {
        include_graph_name: true,
        graph_name_from_ontology: true,
        include_statement_id: true,
        ..Default::default()
    };
    let report = load(&db, &["go_nucleus.owl"], config).unwrap();
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM statement WHERE graph = 'obo:go.owl'"),
        report.rows as i64
    );
    assert_eq!(
        count(&db, "SELECT COUNT(DISTINCT id) FROM statement"),
        report.rows as i64
    );
}

#[test]
fn test_missing_input_file() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("missing.db");
    let err = load(&db, &["does_not_exist.owl"], LoaderConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert!(!db.exists());
}

fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

fn force_config() -> LoaderConfig {
    LoaderConfig {
        force: true,
        ..turtle_config()
    }
}

#[test]
fn test_force_with_unknown_mime_keeps_target() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("keep.db");
    load(&db, &["literals.ttl"], turtle_config()).unwrap();
    let before = rows(&db);

    let config = LoaderConfig {
        mime_type: Some("image/png".to_string()),
        ..force_config()
    };
    let err = load(&db, &["literals.ttl"], config).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert_eq!(rows(&db), before);
}

#[test]
fn test_force_with_missing_input_keeps_target() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("keep.db");
    load(&db, &["literals.ttl"], turtle_config()).unwrap();
    let before = rows(&db);

    let err = load(&db, &["literals.ttl", "nope.ttl"], force_config()).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
    assert_eq!(rows(&db), before);
}

#[test]
fn test_force_with_parse_error_keeps_target() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("keep.db");
    load(&db, &["literals.ttl"], turtle_config()).unwrap();
    let before = rows(&db);

    let err = load(&db, &["blank_a.ttl", "malformed.ttl"], force_config()).unwrap_err();
    assert!(matches!(err, Error::Parser { .. }), "unexpected error: {err}");
    assert_eq!(rows(&db), before);
    assert_eq!(dir_entries(dir.path()), vec!["keep.db"]);
}

#[test]
fn test_force_replaces_without_leftovers() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("keep.db");
    load(&db, &["literals.ttl"], turtle_config()).unwrap();

    let report = load(&db, &["blank_a.ttl"], force_config()).unwrap();
    assert_eq!(rows(&db).len(), report.rows);
    assert_eq!(dir_entries(dir.path()), vec!["keep.db"]);
}

#[test]
fn test_shacl_halves_in_different_files_ignored() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("half.db");
    let config = LoaderConfig {
        scope_blank_nodes_per_file: true,
        ..turtle_config()
    };
    let report = load(&db, &["half_prefix.ttl", "half_namespace.ttl"], config).unwrap();
    assert_eq!(report.prefixes_discovered, 0);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM prefix WHERE prefix = 'HALF'"), 0);
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM statement WHERE subject = 'http://example.org/HALF_1'"),
        1
    );
}
