use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn topaz(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("topaz").unwrap();
    cmd.env_remove("TOPAZ_LOG_DIR").arg("--db").arg(db);
    cmd
}

fn add_note(db: &Path, title: &str, tags: &str) -> String {
    let output = topaz(db)
        .args(["add", "--title", title, "--body", "body text", "--tags", tags])
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

#[test]
fn add_then_list_shows_note_and_tags() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("notes.db");

    let id = add_note(&db, "First", "#history, #rust");

    topaz(&db)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("{id}\tFirst")))
        .stdout(predicate::str::contains("#history"))
        .stdout(predicate::str::contains("#rust"));
}

#[test]
fn edit_keeps_omitted_fields_and_replaces_tags() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("notes.db");
    let id = add_note(&db, "Draft", "a b c");

    topaz(&db)
        .args(["edit", id.as_str(), "--tags", "b,c,d"])
        .assert()
        .success();

    topaz(&db)
        .args(["show", "Draft"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\tDraft\tb\t"))
        .stdout(predicate::str::contains("\tDraft\td\t"))
        .stdout(predicate::str::contains("\tDraft\ta\t").not());
}

#[test]
fn missing_note_exits_with_not_found_code() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("notes.db");

    topaz(&db)
        .args(["rm", "9999"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("note not found: 9999"));

    topaz(&db)
        .args(["edit", "9999", "--title", "x"])
        .assert()
        .code(2);
}

#[test]
fn rm_then_prune_tags_removes_orphans() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("notes.db");
    let id = add_note(&db, "Gone", "solo");

    topaz(&db).args(["rm", id.as_str()]).assert().success();
    topaz(&db)
        .arg("tags")
        .assert()
        .success()
        .stdout(predicate::str::contains("solo\t0"));

    topaz(&db)
        .arg("prune-tags")
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 1 unused tag(s)"));
    topaz(&db)
        .arg("tags")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn list_json_is_machine_readable() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("notes.db");
    add_note(&db, "Json", "x");

    let output = topaz(&db).args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value[0]["title"], "Json");
    assert_eq!(value[0]["tags"][0], "x");
}
