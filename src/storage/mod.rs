//! Storage Layer - SQLite-backed persistence
//!
//! Tables:
//! - statement(subject, predicate, object, value, datatype, language[, graph])
//!   with an optional leading `id` column
//! - prefix(prefix, base)
//! - statements(stanza, subject, predicate, object, value, datatype, language)
//!   when rdftab compatibility is on

pub mod schema;
pub mod sqlite;

pub use schema::{StatementLayout, StatementRow};
pub use sqlite::{DbStats, SqliteStore};
