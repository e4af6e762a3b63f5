//! Database schema definitions

/// SQL to create the prefix table
pub const CREATE_PREFIX_TABLE: &str = r#"
CREATE TABLE prefix (
    prefix TEXT,
    base TEXT
)
"#;

/// SQL to create the rdftab-compatible mirror table
pub const CREATE_RDFTAB_STATEMENTS_TABLE: &str = r#"
CREATE TABLE statements (
    stanza TEXT,
    subject TEXT,
    predicate TEXT,
    object TEXT,
    value TEXT,
    datatype TEXT,
    language TEXT
)
"#;

/// Copy rows written after a given rowid into the mirror table,
/// using the subject as the stanza
pub const COPY_TO_RDFTAB_STATEMENTS: &str = r#"
INSERT INTO statements (stanza, subject, predicate, object, value, datatype, language)
SELECT subject, subject, predicate, object, value, datatype, language
FROM statement
WHERE rowid > ?1
ORDER BY rowid
"#;

/// Insert a prefix unless the same prefix is already present
pub const INSERT_PREFIX: &str = r#"
INSERT INTO prefix (prefix, base)
SELECT ?1, ?2
WHERE NOT EXISTS (SELECT 1 FROM prefix WHERE prefix = ?1)
"#;

/// SQL to create indexes on the statement table
pub const CREATE_STATEMENT_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_statement_subject ON statement(subject)",
    "CREATE INDEX IF NOT EXISTS idx_statement_predicate ON statement(predicate)",
    "CREATE INDEX IF NOT EXISTS idx_statement_object ON statement(object)",
    "CREATE INDEX IF NOT EXISTS idx_statement_value ON statement(value)",
];

/// SQL to create indexes on the mirror table
pub const CREATE_RDFTAB_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_statements_stanza ON statements(stanza)",
    "CREATE INDEX IF NOT EXISTS idx_statements_subject ON statements(subject)",
    "CREATE INDEX IF NOT EXISTS idx_statements_predicate ON statements(predicate)",
];

const CORE_COLUMNS: &[&str] = &["subject", "predicate", "object", "value", "datatype", "language"];

/// One row of the `statement` table.
///
/// Exactly one of `object` and `value` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementRow {
    pub id: Option<String>,
    pub subject: String,
    pub predicate: String,
    pub object: Option<String>,
    pub value: Option<String>,
    pub datatype: Option<String>,
    pub language: Option<String>,
    pub graph: Option<String>,
}

impl StatementRow {
    pub fn new(subject: impl Into<String>, predicate: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            ..Default::default()
        }
    }
}

/// Column layout of the `statement` table.
///
/// The optional `id` column comes first and the optional `graph` column last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatementLayout {
    pub include_statement_id: bool,
    pub include_graph_name: bool,
}

impl StatementLayout {
    pub fn new(include_statement_id: bool, include_graph_name: bool) -> Self {
        Self {
            include_statement_id,
            include_graph_name,
        }
    }

    /// Column names in table order
    pub fn columns(&self) -> Vec<&'static str> {
        let mut cols = Vec::with_capacity(CORE_COLUMNS.len() + 2);
        if self.include_statement_id {
            cols.push("id");
        }
        cols.extend_from_slice(CORE_COLUMNS);
        if self.include_graph_name {
            cols.push("graph");
        }
        cols
    }

    /// `CREATE TABLE statement (...)`
    pub fn create_table_sql(&self) -> String {
        let cols: Vec<String> = self
            .columns()
            .iter()
            .map(|c| format!("    {} TEXT", c))
            .collect();
        format!("CREATE TABLE statement (\n{}\n)", cols.join(",\n"))
    }

    /// Parameterized insert for one row
    pub fn insert_sql(&self) -> String {
        let cols = self.columns();
        let placeholders: Vec<String> = (1..=cols.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO statement ({}) VALUES ({})",
            cols.join(", "),
            placeholders.join(", ")
        )
    }

    /// Values of a row in column order
    pub fn values<'a>(&self, row: &'a StatementRow) -> Vec<Option<&'a str>> {
        let mut values = Vec::with_capacity(CORE_COLUMNS.len() + 2);
        if self.include_statement_id {
            values.push(row.id.as_deref());
        }
        values.push(Some(row.subject.as_str()));
        values.push(Some(row.predicate.as_str()));
        values.push(row.object.as_deref());
        values.push(row.value.as_deref());
        values.push(row.datatype.as_deref());
        values.push(row.language.as_deref());
        if self.include_graph_name {
            values.push(row.graph.as_deref());
        }
        values
    }
}

/// DDL for a fresh target
pub fn all_schema_statements(layout: &StatementLayout, rdftab_compatibility: bool) -> Vec<String> {
    let mut stmts = vec![layout.create_table_sql(), CREATE_PREFIX_TABLE.to_string()];
    if rdftab_compatibility {
        stmts.push(CREATE_RDFTAB_STATEMENTS_TABLE.to_string());
    }
    stmts
}
