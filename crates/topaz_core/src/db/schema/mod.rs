//! Schema manager for the `note`, `tag` and `note_tag` tables.
//!
//! # Responsibility
//! - Create the note/tag schema when absent.
//! - Stamp the schema version into `PRAGMA user_version`.
//!
//! # Invariants
//! - DDL is `IF NOT EXISTS` only; existing rows are never touched.
//! - A database stamped with a newer version is rejected, not modified.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Schema version written by this binary.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = include_str!("0001_init.sql");

/// Creates the note/tag schema if it is missing.
///
/// Safe to call on every start and any number of times per connection.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the file was written by a newer
///   binary.
/// - `DbError::MissingRequiredTable`/`MissingRequiredColumn` when a table of
///   the same name already exists with another layout; the file is left as
///   it was, version stamp included.
/// - `DbError::Sqlite` for any storage failure; nothing is committed then.
pub fn ensure_schema(conn: &mut Connection) -> DbResult<()> {
    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    verify_schema(&tx)?;
    if current != SCHEMA_VERSION {
        tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    }
    tx.commit()?;
    Ok(())
}

/// Reads the schema version stamped on this database (`0` when unstamped).
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("note", &["id", "title", "body"]),
    ("tag", &["id", "name"]),
    ("note_tag", &["tag_id", "note_id", "linked_at"]),
];

/// Checks that every table and column the note repository queries exists.
///
/// Does not create anything; use [`ensure_schema`] for that.
pub fn verify_schema(conn: &Connection) -> DbResult<()> {
    for &(table, columns) in REQUIRED_COLUMNS {
        if !table_exists(conn, table)? {
            return Err(DbError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(DbError::MissingRequiredColumn { table, column });
            }
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> DbResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
