use notekeeper_core::db::migrations::latest_version;
use notekeeper_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "users");
    assert_table_exists(&conn, "notes");
}

#[test]
fn opened_connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notekeeper.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "notes");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

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
fn schema_rejects_out_of_range_titles_and_statuses() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO users (id, name, email, role, created_at)
         VALUES ('u1', 'Member One', 'member1@example.com', 'member', 0);",
    )
    .unwrap();

    let empty_title = conn.execute(
        "INSERT INTO notes (id, title, user_id, created_at) VALUES ('n1', '', 'u1', 0);",
        [],
    );
    assert!(empty_title.is_err());

    let bad_status = conn.execute(
        "INSERT INTO notes (id, title, status, user_id, created_at)
         VALUES ('n2', 't', 'deleted', 'u1', 0);",
        [],
    );
    assert!(bad_status.is_err());

    conn.execute(
        "INSERT INTO notes (id, title, user_id, created_at) VALUES ('n3', 't', 'u1', 0);",
        [],
    )
    .unwrap();
    let status: String = conn
        .query_row("SELECT status FROM notes WHERE id = 'n3';", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(status, "active");
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
