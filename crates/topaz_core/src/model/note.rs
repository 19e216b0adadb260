//! Note and tag read models.

use serde::{Deserialize, Serialize};

/// Identifier of a persisted note, generated by storage on creation.
pub type NoteId = i64;

/// Identifier of a persisted tag, generated on first use of its name.
pub type TagId = i64;

/// Aggregated view of one note with every tag attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub id: NoteId,
    pub title: String,
    pub body: String,
    /// Attached tag names. Empty when the note has no tags.
    ///
    /// Callers must not rely on the ordering.
    pub tags: Vec<String>,
}

impl NoteRecord {
    /// Returns whether `tag` is attached to this note.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|name| name == tag)
    }
}

/// Flattened view: one row per (note, tag) association.
///
/// A note without tags yields exactly one row with `tag: None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteTagRow {
    pub note_id: NoteId,
    pub title: String,
    pub body: String,
    pub tag: Option<String>,
}

/// One tag with the number of notes currently referencing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: TagId,
    pub name: String,
    /// `0` for orphaned tags.
    pub note_count: u64,
}

impl TagRecord {
    /// Returns whether no note references this tag.
    pub fn is_orphan(&self) -> bool {
        self.note_count == 0
    }
}
