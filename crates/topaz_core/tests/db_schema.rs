use rusqlite::Connection;
use topaz_core::db::schema::{ensure_schema, SCHEMA_VERSION};
use topaz_core::db::{open_db, open_db_in_memory, DbError};
use topaz_core::{NoteService, SqliteNoteRepository};

#[test]
fn open_db_in_memory_creates_note_tag_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), SCHEMA_VERSION);
    assert_table_exists(&conn, "note");
    assert_table_exists(&conn, "tag");
    assert_table_exists(&conn, "note_tag");
    assert!(foreign_keys_enabled(&conn));
}

#[test]
fn ensure_schema_twice_keeps_existing_rows() {
    let service = NoteService::open_in_memory().unwrap();
    let id = service
        .create_note("kept", "body", &["x".to_string()])
        .unwrap();

    service.ensure_schema().unwrap();
    service.ensure_schema().unwrap();

    let note = service.get_note(id).unwrap().unwrap();
    assert_eq!(note.title, "kept");
    assert_eq!(note.tags, vec!["x".to_string()]);
}

#[test]
fn reopening_file_database_keeps_schema_and_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.db");

    let id = {
        let service = NoteService::open(&path).unwrap();
        service
            .create_note("persisted", "across opens", &["disk".to_string()])
            .unwrap()
    };

    let service = NoteService::open(&path).unwrap();
    let notes = service.read_all_notes().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[&id].body, "across opens");

    let repo = service.into_repository();
    assert_eq!(schema_version(repo.connection()), SCHEMA_VERSION);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn ensure_schema_adopts_unstamped_database_with_same_tables() {
    let mut conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE note (id INTEGER PRIMARY KEY, title TEXT NOT NULL, body TEXT NOT NULL);
         INSERT INTO note (title, body) VALUES ('old', 'row');",
    )
    .unwrap();

    ensure_schema(&mut conn).unwrap();

    assert_eq!(schema_version(&conn), SCHEMA_VERSION);
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM note;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn opening_legacy_layout_file_is_rejected_without_stamping_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE note (id INTEGER PRIMARY KEY, title VARCHAR(24), text TEXT);
         CREATE TABLE tag (id INTEGER PRIMARY KEY, name VARCHAR(24) UNIQUE);
         CREATE TABLE note_tag (tag_id INTEGER, note_id INTEGER, PRIMARY KEY (tag_id, note_id));
         INSERT INTO note (title, text) VALUES ('old', 'row');",
    )
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(
        matches!(
            err,
            DbError::MissingRequiredColumn {
                table: "note",
                column: "body"
            }
        ),
        "unexpected error: {err}"
    );

    let mut conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
    assert!(ensure_schema(&mut conn).is_err());
    assert_eq!(schema_version(&conn), 0);
    let index_count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name = 'idx_note_tag_note_id';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(index_count, 0);
}

#[test]
fn repository_rejects_connection_without_schema() {
    let conn = Connection::open_in_memory().unwrap();
    let err = SqliteNoteRepository::try_new(conn).err().unwrap();
    assert!(matches!(err, DbError::MissingRequiredTable("note")));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn foreign_keys_enabled(conn: &Connection) -> bool {
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    enabled == 1
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
