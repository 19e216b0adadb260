//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide note CRUD on top of the `note`, `tag` and `note_tag` tables.
//! - Compose tag resolution and tag-diff reconciliation into note writes.
//!
//! # Invariants
//! - Every write runs in one `BEGIN IMMEDIATE` transaction and either fully
//!   commits or fully rolls back.
//! - After `update_note` the note's association set equals the resolved
//!   input tags; associations in both old and new sets are not rewritten.
//! - Deleting a note removes all of its associations.
//! - Orphaned tags are left in place; only `prune_orphan_tags` removes them.

use crate::db::schema::{ensure_schema, verify_schema};
use crate::db::{DbError, DbResult};
use crate::model::note::{NoteId, NoteRecord, NoteTagRow, TagId, TagRecord};
use crate::repo::tag_diff::TagDiff;
use crate::repo::tag_repo::{list_tags, prune_orphan_tags, resolve_tags};
use rusqlite::{params, Connection, Rows, TransactionBehavior};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NOTE_WITH_TAGS_SQL: &str = "SELECT
    n.id,
    n.title,
    n.body,
    t.name AS tag
FROM note n
LEFT JOIN note_tag nt ON nt.note_id = n.id
LEFT JOIN tag t ON t.id = nt.tag_id";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for a single repository operation.
#[derive(Debug)]
pub enum RepoError {
    /// Storage failure; the operation's transaction was rolled back.
    Db(DbError),
    /// Target note does not exist. Nothing was changed.
    NotFound(NoteId),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "note not found: {id}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for note/tag operations.
pub trait NoteRepository {
    /// Creates the schema if absent. Idempotent.
    fn ensure_schema(&mut self) -> DbResult<()>;
    /// Creates one note with its tags and returns the generated id.
    fn create_note(&mut self, title: &str, body: &str, tags: &[String]) -> RepoResult<NoteId>;
    /// Gets one note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<NoteRecord>>;
    /// Reads every note with its aggregated tag names.
    fn read_all_notes(&self) -> RepoResult<BTreeMap<NoteId, NoteRecord>>;
    /// Reads one row per (note, tag) pair for notes with exactly this title.
    fn read_notes_by_title(&self, title: &str) -> RepoResult<Vec<NoteTagRow>>;
    /// Replaces title/body and reconciles tags to exactly `tags`.
    fn update_note(
        &mut self,
        id: NoteId,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> RepoResult<()>;
    /// Deletes one note and all of its associations.
    fn delete_note(&mut self, id: NoteId) -> RepoResult<()>;
    /// Lists every tag with its note count, sorted by name.
    fn list_tags(&self) -> RepoResult<Vec<TagRecord>>;
    /// Deletes tags with no associations. Never called implicitly.
    fn prune_orphan_tags(&mut self) -> RepoResult<usize>;
}

/// SQLite-backed note repository owning its connection.
pub struct SqliteNoteRepository {
    conn: Connection,
}

impl SqliteNoteRepository {
    /// Constructs a repository over a connection that already has the schema.
    ///
    /// Use `db::open_db`/`db::open_db_in_memory` to get such a connection.
    pub fn try_new(conn: Connection) -> DbResult<Self> {
        verify_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Read-only access to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl NoteRepository for SqliteNoteRepository {
    fn ensure_schema(&mut self) -> DbResult<()> {
        ensure_schema(&mut self.conn)
    }

    fn create_note(&mut self, title: &str, body: &str, tags: &[String]) -> RepoResult<NoteId> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let resolved = resolve_tags(&tx, tags)?;

        tx.execute(
            "INSERT INTO note (title, body) VALUES (?1, ?2);",
            params![title, body],
        )?;
        let id = tx.last_insert_rowid();
        link_tags(&tx, id, resolved.values().copied())?;

        tx.commit()?;
        Ok(id)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<NoteRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_WITH_TAGS_SQL} WHERE n.id = ?1 ORDER BY t.name ASC;"
        ))?;
        let rows = stmt.query([id])?;
        let mut notes = collect_note_records(rows)?;
        Ok(notes.remove(&id))
    }

    fn read_all_notes(&self) -> RepoResult<BTreeMap<NoteId, NoteRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_WITH_TAGS_SQL} ORDER BY n.id ASC, t.name ASC;"
        ))?;
        let rows = stmt.query([])?;
        collect_note_records(rows)
    }

    fn read_notes_by_title(&self, title: &str) -> RepoResult<Vec<NoteTagRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTE_WITH_TAGS_SQL} WHERE n.title = ?1 ORDER BY n.id ASC, t.name ASC;"
        ))?;
        let mut rows = stmt.query([title])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(NoteTagRow {
                note_id: row.get("id")?,
                title: row.get("title")?,
                body: row.get("body")?,
                tag: row.get("tag")?,
            });
        }
        Ok(out)
    }

    fn update_note(
        &mut self,
        id: NoteId,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !note_exists(&tx, id)? {
            return Err(RepoError::NotFound(id));
        }

        let resolved = resolve_tags(&tx, tags)?;
        tx.execute(
            "UPDATE note SET title = ?2, body = ?3 WHERE id = ?1;",
            params![id, title, body],
        )?;

        let current = tag_ids_for_note(&tx, id)?;
        let desired: BTreeSet<TagId> = resolved.into_values().collect();
        let diff = TagDiff::between(&current, &desired);
        link_tags(&tx, id, diff.to_add.iter().copied())?;
        unlink_tags(&tx, id, diff.to_remove.iter().copied())?;

        tx.commit()?;
        Ok(())
    }

    fn delete_note(&mut self, id: NoteId) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM note_tag WHERE note_id = ?1;", [id])?;
        let removed = tx.execute("DELETE FROM note WHERE id = ?1;", [id])?;
        if removed == 0 {
            return Err(RepoError::NotFound(id));
        }

        tx.commit()?;
        Ok(())
    }

    fn list_tags(&self) -> RepoResult<Vec<TagRecord>> {
        list_tags(&self.conn)
    }

    fn prune_orphan_tags(&mut self) -> RepoResult<usize> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let removed = prune_orphan_tags(&tx)?;
        tx.commit()?;
        Ok(removed)
    }
}

/// Folds `NOTE_WITH_TAGS_SQL` rows into one record per note.
fn collect_note_records(mut rows: Rows<'_>) -> RepoResult<BTreeMap<NoteId, NoteRecord>> {
    let mut notes: BTreeMap<NoteId, NoteRecord> = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let id: NoteId = row.get("id")?;
        let note = match notes.entry(id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(NoteRecord {
                id,
                title: row.get("title")?,
                body: row.get("body")?,
                tags: Vec::new(),
            }),
        };
        if let Some(tag) = row.get::<_, Option<String>>("tag")? {
            note.tags.push(tag);
        }
    }
    Ok(notes)
}

fn note_exists(conn: &Connection, id: NoteId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM note WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn tag_ids_for_note(conn: &Connection, id: NoteId) -> RepoResult<BTreeSet<TagId>> {
    let mut stmt = conn.prepare_cached("SELECT tag_id FROM note_tag WHERE note_id = ?1;")?;
    let mut rows = stmt.query([id])?;
    let mut ids = BTreeSet::new();
    while let Some(row) = rows.next()? {
        ids.insert(row.get(0)?);
    }
    Ok(ids)
}

fn link_tags(
    conn: &Connection,
    note_id: NoteId,
    tag_ids: impl IntoIterator<Item = TagId>,
) -> RepoResult<()> {
    let mut stmt =
        conn.prepare_cached("INSERT INTO note_tag (tag_id, note_id) VALUES (?1, ?2);")?;
    for tag_id in tag_ids {
        stmt.execute([tag_id, note_id])?;
    }
    Ok(())
}

fn unlink_tags(
    conn: &Connection,
    note_id: NoteId,
    tag_ids: impl IntoIterator<Item = TagId>,
) -> RepoResult<()> {
    let mut stmt =
        conn.prepare_cached("DELETE FROM note_tag WHERE tag_id = ?1 AND note_id = ?2;")?;
    for tag_id in tag_ids {
        stmt.execute([tag_id, note_id])?;
    }
    Ok(())
}
