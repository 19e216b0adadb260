//! Note/tag persistence core for Topaz.
//! Front ends call into [`NoteService`] and render what it returns.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::note::{NoteId, NoteRecord, NoteTagRow, TagId, TagRecord};
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use repo::tag_diff::TagDiff;
pub use repo::tag_repo::{normalize_tag, normalize_tags};
pub use service::note_service::NoteService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
