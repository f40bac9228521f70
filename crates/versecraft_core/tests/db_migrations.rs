use rusqlite::Connection;
use versecraft_core::db::migrations::latest_version;
use std::time::Duration;
use versecraft_core::db::{
    open_db, open_db_in_memory, open_db_with_busy_timeout, DbError, DEFAULT_BUSY_TIMEOUT,
};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "poems");
    assert_table_exists(&conn, "contributions");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("versecraft.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "poems");
}

#[test]
fn connections_wait_for_the_configured_busy_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("versecraft.sqlite3");

    let default_conn = open_db(&path).unwrap();
    assert_eq!(
        busy_timeout_ms(&default_conn),
        DEFAULT_BUSY_TIMEOUT.as_millis() as i64
    );

    let tuned_conn = open_db_with_busy_timeout(&path, Duration::from_millis(45_000)).unwrap();
    assert_eq!(busy_timeout_ms(&tuned_conn), 45_000);
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let err = conn
        .execute(
            "INSERT INTO contributions (uuid, poem_uuid, author_id, content, position)
             VALUES ('c1', 'missing-poem', 'a1', 'line', 1);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"), "unexpected error: {err}");
}

#[test]
fn duplicate_line_position_is_rejected_by_schema() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO poems (uuid, title, form, creator_id, is_collaborative)
         VALUES ('p1', 'Pond', 'haiku', 'a1', 1);
         INSERT INTO contributions (uuid, poem_uuid, author_id, content, position)
         VALUES ('c1', 'p1', 'a1', 'first', 1);",
    )
    .unwrap();

    let err = conn
        .execute(
            "INSERT INTO contributions (uuid, poem_uuid, author_id, content, position)
             VALUES ('c2', 'p1', 'a2', 'second', 1);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("UNIQUE"), "unexpected error: {err}");
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
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

fn busy_timeout_ms(conn: &Connection) -> i64 {
    conn.pragma_query_value(None, "busy_timeout", |row| row.get(0))
        .unwrap()
}
