use menagerie_core::db::migrations::{current_version, latest_version};
use menagerie_core::{
    run_demo, ConnectionError, Database, DatabaseConfig, Entity, Repository, SqliteRepository,
    StoreLocation, Toy,
};
use rusqlite::Connection;
use std::path::Path;
use uuid::Uuid;

#[test]
fn open_in_memory_applies_all_migrations() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(db.location(), &StoreLocation::Memory);

    let session = db.session().unwrap();
    let conn = session.connection();
    assert_eq!(current_version(conn).unwrap(), latest_version());
    assert_table_exists(conn, "toys");
    assert_table_exists(conn, "owners");
    assert_table_exists(conn, "animals");
}

#[test]
fn connecting_to_same_file_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir.path().join("menagerie.db"));

    let first = Database::connect(&config).unwrap();
    drop(first);

    let second = Database::connect(&config).unwrap();
    let session = second.session().unwrap();
    assert_eq!(current_version(session.connection()).unwrap(), latest_version());
    assert_eq!(table_count(session.connection(), "toys"), 1);
    assert_eq!(table_count(session.connection(), "owners"), 1);
    assert_eq!(table_count(session.connection(), "animals"), 1);
}

#[test]
fn concurrent_factories_share_one_schema() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir.path().join("shared.db"));

    let first = Database::connect(&config).unwrap();
    let second = Database::connect(&config).unwrap();

    let session = second.session().unwrap();
    assert_eq!(table_count(session.connection(), "animals"), 1);
    drop(session);
    drop(first);
}

#[test]
fn existing_tables_without_version_are_adopted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let legacy_toy_id = Uuid::new_v4();
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE toys (
            id VARCHAR NOT NULL,
            name VARCHAR,
            toy_type VARCHAR,
            PRIMARY KEY (id)
        );
        CREATE TABLE owners (
            id VARCHAR NOT NULL,
            name VARCHAR,
            contact_info VARCHAR,
            PRIMARY KEY (id)
        );
        CREATE TABLE animals (
            id VARCHAR NOT NULL,
            name VARCHAR,
            age INTEGER,
            favorite_toy_id VARCHAR,
            owner_id VARCHAR,
            PRIMARY KEY (id),
            FOREIGN KEY(favorite_toy_id) REFERENCES toys (id),
            FOREIGN KEY(owner_id) REFERENCES owners (id)
        );",
    )
    .unwrap();
    conn.execute(
        "INSERT INTO toys (id, name, toy_type) VALUES (?1, 'Old Rope', 'Cotton');",
        [legacy_toy_id.to_string()],
    )
    .unwrap();
    drop(conn);

    let db = Database::connect(&file_config(&path)).unwrap();
    {
        let session = db.session().unwrap();
        let conn = session.connection();
        assert_eq!(current_version(conn).unwrap(), latest_version());
        for table in ["toys", "owners", "animals"] {
            assert_eq!(table_count(conn, table), 1);
            assert_column_exists(conn, table, "created_at");
            assert_column_exists(conn, table, "updated_at");
        }
    }

    let outcome = run_demo(&db).unwrap();
    assert_eq!(outcome.fetched.as_ref(), Some(&outcome.inserted));

    db.session_scope(|session| {
        let repo = SqliteRepository::new(session);
        let legacy = repo.get_by_id::<Toy>(legacy_toy_id)?.unwrap();
        assert_eq!(legacy.name, "Old Rope");
        assert_eq!(legacy.timestamps().created_at(), 0);
        Ok(())
    })
    .unwrap();
}

#[test]
fn connecting_to_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = Database::connect(&file_config(&path)).unwrap_err();
    match err {
        ConnectionError::UnsupportedSchemaVersion {
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
fn malformed_connection_string_is_a_connection_error() {
    for url in ["", "mydatabase.db", "postgres://localhost/pets"] {
        let err = Database::connect(&DatabaseConfig::new(url)).unwrap_err();
        assert!(
            matches!(err, ConnectionError::InvalidUrl { .. }),
            "{url}: unexpected error {err}"
        );
    }
}

#[test]
fn unreachable_path_is_a_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("nested").join("pets.db");

    let err = Database::connect(&file_config(&path)).unwrap_err();
    assert!(matches!(err, ConnectionError::Open(_)), "unexpected error: {err}");
}

#[test]
fn non_database_file_is_a_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "plain text, not a database\n".repeat(64)).unwrap();

    let err = Database::connect(&file_config(&path)).unwrap_err();
    assert!(matches!(err, ConnectionError::Open(_)), "unexpected error: {err}");
}

#[test]
fn pooled_connections_enforce_foreign_keys() {
    let db = Database::open_in_memory().unwrap();
    let session = db.session().unwrap();
    let enabled: i64 = session
        .connection()
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn zero_recycle_age_and_pool_size_are_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = file_config(&dir.path().join("tuned.db"));
    config.pool_recycle = Some(std::time::Duration::ZERO);
    config.max_connections = 0;

    let db = Database::connect(&config).unwrap();
    assert!(db.pool_status().connections >= 1);
}

fn file_config(path: &Path) -> DatabaseConfig {
    DatabaseConfig::new(format!("sqlite:///{}", path.display()))
}

fn table_count(conn: &Connection, table_name: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1;",
        [table_name],
        |row| row.get(0),
    )
    .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert_eq!(
        table_count(conn, table_name),
        1,
        "table {table_name} does not exist"
    );
}

fn assert_column_exists(conn: &Connection, table_name: &str, column: &str) {
    let found: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2;",
            [table_name, column],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(found, 1, "column {table_name}.{column} does not exist");
}
