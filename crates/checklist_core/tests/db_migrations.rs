use checklist_core::db::migrations::latest_version;
use checklist_core::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "checklists");
    assert_table_exists(&conn, "checklist_items");
    assert_table_exists(&conn, "profiles");
}

#[test]
fn reopening_file_database_keeps_schema_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checklists.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "checklist_items");
}

#[test]
fn newer_schema_version_is_rejected() {
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
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn negative_sort_order_violates_check_constraint() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO checklists (checklist_uuid, owner_uuid, title) VALUES (?1, ?2, ?3);",
        params!["c-1", "o-1", "Pre-op"],
    )
    .unwrap();

    let result = conn.execute(
        "INSERT INTO checklist_items (item_uuid, checklist_uuid, content, sort_order, created_seq)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params!["i-1", "c-1", "Fasting", -1, 1],
    );
    assert!(result.is_err());
}

#[test]
fn deleting_checklist_cascades_to_items() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO checklists (checklist_uuid, owner_uuid, title) VALUES (?1, ?2, ?3);",
        params!["c-1", "o-1", "Pre-op"],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO checklist_items (item_uuid, checklist_uuid, content, sort_order, created_seq)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params!["i-1", "c-1", "Fasting", 0, 1],
    )
    .unwrap();

    conn.execute("DELETE FROM checklists WHERE checklist_uuid = 'c-1';", [])
        .unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM checklist_items;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
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
