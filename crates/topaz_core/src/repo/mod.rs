//! Repository layer for notes, tags and their associations.
//!
//! # Responsibility
//! - Keep every SQL statement for note/tag data inside this module.
//! - Run each write as one transaction so nothing commits partially.
//!
//! # Invariants
//! - The repository is the only writer of `note`, `tag` and `note_tag`.
//! - Missing notes surface as `RepoError::NotFound`, distinct from storage
//!   failures.

pub mod note_repo;
pub mod tag_diff;
pub mod tag_repo;
