//! Schema migration and column-rename behavior.

mod common;

use common::{open_test_db, stub_registry, StubDomain};
use tempfile::TempDir;
use vigil_store::{migrations, Database};

#[test]
fn fresh_store_migrates_to_current_version() {
    let db = open_test_db();
    assert_eq!(
        migrations::current_version(&db).unwrap(),
        migrations::CURRENT_VERSION
    );

    for table in ["meta", "tasks", "reports", "credentials"] {
        let count: i64 = db
            .with_conn(|conn| {
                conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))
                    .map_err(Into::into)
            })
            .unwrap_or_else(|_| panic!("table {table} should exist"));
        assert_eq!(count, 0);
    }
}

#[test]
fn migrate_is_idempotent() {
    let db = open_test_db();
    let v1 = migrations::migrate(&db).unwrap();
    let v2 = migrations::migrate(&db).unwrap();
    assert_eq!(v1, v2);
}

#[test]
fn reopening_a_file_backed_store_keeps_schema_and_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tasks.db");

    {
        let db = Database::open(&path, &stub_registry(StubDomain::default())).unwrap();
        db.run(
            "INSERT INTO meta (name, value) VALUES ('installed', '1')",
            &[],
        )
        .unwrap();
        db.close().unwrap();
    }

    let db = Database::open(&path, &stub_registry(StubDomain::default())).unwrap();
    assert_eq!(
        migrations::current_version(&db).unwrap(),
        migrations::CURRENT_VERSION
    );
    let value: String = db
        .with_conn(|conn| {
            conn.query_row("SELECT value FROM meta WHERE name = 'installed'", [], |r| {
                r.get(0)
            })
            .map_err(Into::into)
        })
        .unwrap();
    assert_eq!(value, "1");
}

#[test]
fn rename_column_copies_rows_under_the_new_name() {
    let db = open_test_db();
    db.run(
        "CREATE TABLE scans (id INTEGER PRIMARY KEY, uuid TEXT, label TEXT) STRICT",
        &[],
    )
    .unwrap();
    db.run(
        "CREATE TABLE scans_new (id INTEGER PRIMARY KEY, uuid TEXT, title TEXT) STRICT",
        &[],
    )
    .unwrap();
    db.run(
        "INSERT INTO scans (id, uuid, label) VALUES (1, 'a', 'weekly'), (2, 'b', 'nightly')",
        &[],
    )
    .unwrap();

    migrations::rename_column(&db, "scans", "scans_new", "label", "title").unwrap();

    let rows = db
        .with_cursor(
            "SELECT id, uuid, title FROM scans_new ORDER BY id",
            &[],
            |cursor| {
                let mut rows = Vec::new();
                while cursor.advance()? {
                    rows.push((
                        cursor.column_i64(0)?,
                        cursor.column_string(1)?.unwrap(),
                        cursor.column_string(2)?.unwrap(),
                    ));
                }
                Ok(rows)
            },
        )
        .unwrap();
    assert_eq!(
        rows,
        vec![
            (1, "a".to_string(), "weekly".to_string()),
            (2, "b".to_string(), "nightly".to_string()),
        ]
    );
}

#[test]
fn rename_column_on_empty_source_is_a_silent_noop() {
    let db = open_test_db();
    db.run("CREATE TABLE empty_src (id INTEGER, name TEXT) STRICT", &[])
        .unwrap();
    // The destination does not even have to exist: nothing is copied.
    migrations::rename_column(&db, "empty_src", "missing_dest", "name", "title").unwrap();
}

#[test]
fn rename_column_rejects_malformed_table_names() {
    let db = open_test_db();
    let err = migrations::rename_column(&db, "x; DROP TABLE tasks", "y", "a", "b").unwrap_err();
    assert!(err.is_fatal(), "got {err:?}");
}
