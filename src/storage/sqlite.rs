//! SQLite storage implementation

use std::path::Path;

use rusqlite::{params, params_from_iter, Connection};
use tracing::{debug, warn};

use super::schema::{self, StatementLayout, StatementRow};
use crate::Result;

/// SQLite-backed sink for statement and prefix rows.
///
/// Any transaction still open when the store is dropped is rolled back, so a
/// load that bails out early never leaves committed partial data behind.
pub struct SqliteStore {
    conn: Connection,
    in_transaction: bool,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    /// Underlying connection, for ad hoc queries
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========== Transactions ==========

    /// Begin a transaction for bulk operations
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", [])?;
        self.in_transaction = true;
        Ok(())
    }

    /// Commit a transaction
    pub fn commit(&mut self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        self.in_transaction = false;
        Ok(())
    }

    /// Rollback a transaction
    pub fn rollback(&mut self) -> Result<()> {
        self.in_transaction = false;
        self.conn.execute("ROLLBACK", [])?;
        Ok(())
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    // ========== Schema ==========

    /// Execute a single DDL statement
    pub fn execute_ddl(&self, sql: &str) -> Result<()> {
        self.conn.execute(sql, [])?;
        Ok(())
    }

    /// Check whether a table exists
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Create lookup indexes on the statement tables
    pub fn create_indexes(&self, rdftab_compatibility: bool) -> Result<()> {
        for stmt in schema::CREATE_STATEMENT_INDEXES {
            self.conn.execute(stmt, [])?;
        }
        if rdftab_compatibility {
            for stmt in schema::CREATE_RDFTAB_INDEXES {
                self.conn.execute(stmt, [])?;
            }
        }
        Ok(())
    }

    // ========== Rows ==========

    /// Insert prefix entries, skipping prefixes already in the table.
    ///
    /// Returns the number of rows actually inserted.
    pub fn insert_prefixes(&self, entries: &[(String, String)]) -> Result<usize> {
        let mut stmt = self.conn.prepare_cached(schema::INSERT_PREFIX)?;
        let mut inserted = 0;
        for (prefix, base) in entries {
            inserted += stmt.execute(params![prefix, base])?;
        }
        Ok(inserted)
    }

    /// Insert a batch of statement rows with one prepared statement
    pub fn insert_statements(&self, layout: &StatementLayout, rows: &[StatementRow]) -> Result<usize> {
        let sql = layout.insert_sql();
        let mut stmt = self.conn.prepare_cached(&sql)?;
        for row in rows {
            stmt.execute(params_from_iter(layout.values(row)))?;
        }
        debug!(rows = rows.len(), "flushed statement batch");
        Ok(rows.len())
    }

    /// Highest rowid currently in `statement` (0 when empty)
    pub fn max_statement_rowid(&self) -> Result<i64> {
        let rowid = self.conn.query_row(
            "SELECT COALESCE(MAX(rowid), 0) FROM statement",
            [],
            |row| row.get(0),
        )?;
        Ok(rowid)
    }

    /// Mirror statement rows written after `after_rowid` into `statements`
    pub fn copy_to_rdftab(&self, after_rowid: i64) -> Result<usize> {
        let copied = self
            .conn
            .execute(schema::COPY_TO_RDFTAB_STATEMENTS, params![after_rowid])?;
        Ok(copied)
    }

    // ========== Stats ==========

    fn count_rows(&self, table: &str) -> Result<Option<usize>> {
        if !self.table_exists(table)? {
            return Ok(None);
        }
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(Some(count as usize))
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            statement: self.count_rows("statement")?,
            statements: self.count_rows("statements")?,
            prefix: self.count_rows("prefix")?,
        })
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        if self.in_transaction {
            warn!("rolling back uncommitted load");
            if let Err(e) = self.rollback() {
                warn!("rollback failed: {}", e);
            }
        }
    }
}

/// Row counts per table; `None` when the table does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DbStats {
    pub statement: Option<usize>,
    pub statements: Option<usize>,
    pub prefix: Option<usize>,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |count: Option<usize>| count.map_or("-".to_string(), |c| c.to_string());
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  statement: {}", show(self.statement))?;
        writeln!(f, "  statements: {}", show(self.statements))?;
        write!(f, "  prefix: {}", show(self.prefix))
    }
}
