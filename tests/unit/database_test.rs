//! Unit tests for the session database layer (connection + migrations).

use tabbridge::database::migrations::{get_schema_version, run_all, CURRENT_SCHEMA_VERSION};
use tabbridge::database::Database;
use tempfile::TempDir;

#[test]
fn test_open_in_memory_succeeds() {
    assert!(Database::open_in_memory().is_ok());
}

#[test]
fn test_migrations_create_sessions_table() {
    let db = Database::open_in_memory().unwrap();
    let exists: bool = db.with_connection(|conn| {
        conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='sessions'",
            [],
            |row| row.get(0),
        )
        .unwrap_or(false)
    });
    assert!(exists, "sessions table should exist after migrations");
}

#[test]
fn test_schema_version_is_current() {
    let db = Database::open_in_memory().unwrap();
    let version = db.with_connection(get_schema_version);
    assert_eq!(version, CURRENT_SCHEMA_VERSION);
}

#[test]
fn test_rerunning_migrations_keeps_data() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sessions.db");
    {
        let db = Database::open(&path).unwrap();
        db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, data, tab_count, timestamp) VALUES ('s1', '{}', 0, 1)",
                [],
            )
        })
        .unwrap();
    }
    let db = Database::open(&path).unwrap();
    let rows: i64 = db
        .with_connection(|conn| {
            run_all(conn)?;
            conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
        })
        .unwrap();
    assert_eq!(rows, 1);
}
