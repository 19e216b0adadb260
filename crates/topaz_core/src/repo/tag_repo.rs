//! Tag resolution and tag-set maintenance.
//!
//! # Responsibility
//! - Normalize raw tag input and drop empty names.
//! - Resolve names to ids, creating missing tags on first use.
//! - List tags and prune orphans on explicit request.
//!
//! # Invariants
//! - A tag name is stored at most once (`UNIQUE` + `INSERT OR IGNORE`).
//! - Empty or whitespace-only names never reach storage.
//! - Functions take the caller's connection or transaction and never commit.

use crate::model::note::{TagId, TagRecord};
use crate::repo::note_repo::RepoResult;
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Normalizes one raw tag name.
///
/// Trims the ends and collapses inner whitespace runs to one space. Case is
/// kept as typed. Returns `None` for names that end up empty.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(tag.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

/// Normalizes and deduplicates raw tag names.
pub fn normalize_tags(tags: &[String]) -> BTreeSet<String> {
    tags.iter().filter_map(|tag| normalize_tag(tag)).collect()
}

/// Ensures every distinct non-empty name exists and returns `name -> id`.
///
/// Names already present (including ones inserted concurrently by another
/// connection) are looked up rather than rejected.
pub fn resolve_tags(conn: &Connection, tags: &[String]) -> RepoResult<BTreeMap<String, TagId>> {
    let names = normalize_tags(tags);
    let mut resolved = BTreeMap::new();
    if names.is_empty() {
        return Ok(resolved);
    }

    let mut insert = conn.prepare_cached("INSERT OR IGNORE INTO tag (name) VALUES (?1);")?;
    let mut select = conn.prepare_cached("SELECT id FROM tag WHERE name = ?1;")?;
    for name in names {
        insert.execute([name.as_str()])?;
        let id: TagId = select.query_row([name.as_str()], |row| row.get(0))?;
        resolved.insert(name, id);
    }

    Ok(resolved)
}

/// Lists every tag with its note count, sorted by name.
pub fn list_tags(conn: &Connection) -> RepoResult<Vec<TagRecord>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, COUNT(nt.note_id) AS note_count
         FROM tag t
         LEFT JOIN note_tag nt ON nt.tag_id = t.id
         GROUP BY t.id, t.name
         ORDER BY t.name ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let note_count: i64 = row.get("note_count")?;
        tags.push(TagRecord {
            id: row.get("id")?,
            name: row.get("name")?,
            note_count: u64::try_from(note_count).unwrap_or_default(),
        });
    }
    Ok(tags)
}

/// Deletes tags no note references and returns how many were removed.
pub fn prune_orphan_tags(conn: &Connection) -> RepoResult<usize> {
    let removed = conn.execute(
        "DELETE FROM tag
         WHERE NOT EXISTS (
            SELECT 1 FROM note_tag nt WHERE nt.tag_id = tag.id
         );",
        [],
    )?;
    Ok(removed)
}
