//! Note use-case service.
//!
//! # Responsibility
//! - Own the note repository behind a mutex so one handle serves any thread.
//! - Expose the note/tag API front ends call.
//! - Emit metadata-only `event=note_*` log lines for every write.
//!
//! # Invariants
//! - One repository call runs at a time; each write is its own transaction.
//! - Titles, bodies and tag names are never logged.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::model::note::{NoteId, NoteRecord, NoteTagRow, TagRecord};
use crate::repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Store handle owned by the caller and shared by reference.
pub struct NoteService<R: NoteRepository> {
    repo: Mutex<R>,
}

impl NoteService<SqliteNoteRepository> {
    /// Opens (or creates) a note database file.
    ///
    /// # Errors
    /// Any error here is a fatal startup failure.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let conn = open_db(path)?;
        Ok(Self::new(SqliteNoteRepository::try_new(conn)?))
    }

    /// Opens a private in-memory note database.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = open_db_in_memory()?;
        Ok(Self::new(SqliteNoteRepository::try_new(conn)?))
    }
}

impl<R: NoteRepository> NoteService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self {
            repo: Mutex::new(repo),
        }
    }

    /// Gives the repository back, e.g. to inspect storage directly.
    pub fn into_repository(self) -> R {
        self.repo.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates the schema if absent. Safe to call any number of times.
    pub fn ensure_schema(&self) -> DbResult<()> {
        self.repo().ensure_schema()
    }

    /// Creates one note and returns its id.
    ///
    /// Blank tag names are dropped; duplicates collapse to one association.
    pub fn create_note(&self, title: &str, body: &str, tags: &[String]) -> RepoResult<NoteId> {
        let started_at = Instant::now();
        let result = self.repo().create_note(title, body, tags);
        match &result {
            Ok(id) => info!(
                "event=note_create module=service status=ok note_id={id} tag_inputs={} duration_ms={}",
                tags.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=note_create module=service status=error tag_inputs={} duration_ms={} error={err}",
                tags.len(),
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    /// Gets one note by id, `None` when it does not exist.
    pub fn get_note(&self, id: NoteId) -> RepoResult<Option<NoteRecord>> {
        self.repo().get_note(id)
    }

    /// Reads every note keyed by id, each with its tag names.
    pub fn read_all_notes(&self) -> RepoResult<BTreeMap<NoteId, NoteRecord>> {
        let started_at = Instant::now();
        let notes = self.repo().read_all_notes()?;
        debug!(
            "event=notes_read_all module=service status=ok count={} duration_ms={}",
            notes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(notes)
    }

    /// Reads one row per (note, tag) pair for notes titled exactly `title`.
    pub fn read_notes_by_title(&self, title: &str) -> RepoResult<Vec<NoteTagRow>> {
        let rows = self.repo().read_notes_by_title(title)?;
        debug!(
            "event=notes_read_by_title module=service status=ok rows={}",
            rows.len()
        );
        Ok(rows)
    }

    /// Overwrites title and body and reconciles tags to exactly `tags`.
    ///
    /// # Errors
    /// `RepoError::NotFound` when `id` does not exist; nothing changes then.
    pub fn update_note(
        &self,
        id: NoteId,
        title: &str,
        body: &str,
        tags: &[String],
    ) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo().update_note(id, title, body, tags);
        log_write_outcome("note_update", id, started_at, &result);
        result
    }

    /// Deletes one note with all of its tag associations.
    ///
    /// # Errors
    /// `RepoError::NotFound` when `id` does not exist.
    pub fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let started_at = Instant::now();
        let result = self.repo().delete_note(id);
        log_write_outcome("note_delete", id, started_at, &result);
        result
    }

    /// Lists every tag with its note count, orphans included.
    pub fn list_tags(&self) -> RepoResult<Vec<TagRecord>> {
        self.repo().list_tags()
    }

    /// Deletes tags no note references. Returns the number removed.
    pub fn prune_orphan_tags(&self) -> RepoResult<usize> {
        let started_at = Instant::now();
        let result = self.repo().prune_orphan_tags();
        match &result {
            Ok(removed) => info!(
                "event=tags_prune module=service status=ok removed={removed} duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=tags_prune module=service status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }

    fn repo(&self) -> MutexGuard<'_, R> {
        // A panic mid-call leaves at most an uncommitted transaction, which
        // rusqlite rolls back on drop.
        self.repo.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn log_write_outcome(event: &str, id: NoteId, started_at: Instant, result: &RepoResult<()>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(()) => info!("event={event} module=service status=ok note_id={id} duration_ms={duration_ms}"),
        Err(RepoError::NotFound(_)) => warn!(
            "event={event} module=service status=not_found note_id={id} duration_ms={duration_ms}"
        ),
        Err(err) => error!(
            "event={event} module=service status=error note_id={id} duration_ms={duration_ms} error={err}"
        ),
    }
}
