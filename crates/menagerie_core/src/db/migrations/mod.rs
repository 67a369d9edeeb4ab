//! Schema migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Scripts use `IF NOT EXISTS`, so re-running against an existing schema
//!   never duplicates tables.
//! - Tables adopted from an unversioned store gain any missing timestamp
//!   columns before the store is marked as version 1.

use crate::db::ConnectionError;
use log::{info, warn};
use rusqlite::Connection;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
    /// Runs after `sql`, inside the same transaction.
    fixup: Option<fn(&Connection) -> rusqlite::Result<()>>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        sql: include_str!("0001_init.sql"),
        fixup: Some(add_missing_timestamp_columns),
    },
    Migration {
        version: 2,
        sql: include_str!("0002_reference_indexes.sql"),
        fixup: None,
    },
];

const TIMESTAMPED_TABLES: [&str; 3] = ["toys", "owners", "animals"];
const TIMESTAMP_COLUMNS: [&str; 2] = ["created_at", "updated_at"];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
///
/// # Errors
/// - `ConnectionError::UnsupportedSchemaVersion` when the store is newer than
///   this binary.
/// - `ConnectionError::Schema` when a script fails; nothing is applied then.
pub fn apply_migrations(conn: &mut Connection) -> Result<(), ConnectionError> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(ConnectionError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction().map_err(ConnectionError::Schema)?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)
            .map_err(ConnectionError::Schema)?;
        if let Some(fixup) = migration.fixup {
            fixup(&tx).map_err(ConnectionError::Schema)?;
        }
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
            .map_err(ConnectionError::Schema)?;
    }
    tx.commit().map_err(ConnectionError::Schema)?;

    info!(
        "event=schema_migrate module=db status=ok from_version={} to_version={}",
        current_version, latest
    );
    Ok(())
}

/// Reads `PRAGMA user_version`.
pub fn current_version(conn: &Connection) -> Result<u32, ConnectionError> {
    current_user_version(conn)
}

/// Tables created before timestamps were tracked have no `created_at` or
/// `updated_at`. Adopted rows read back with both set to the epoch.
fn add_missing_timestamp_columns(conn: &Connection) -> rusqlite::Result<()> {
    for table in TIMESTAMPED_TABLES {
        let existing = table_columns(conn, table)?;
        for column in TIMESTAMP_COLUMNS {
            if existing.contains(column) {
                continue;
            }
            conn.execute_batch(&format!(
                "ALTER TABLE {table} ADD COLUMN {column} INTEGER NOT NULL DEFAULT 0;"
            ))?;
            warn!(
                "event=schema_adopt module=db status=column_added table={} column={}",
                table, column
            );
        }
    }
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> rusqlite::Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let names = stmt.query_map([table], |row| row.get::<_, String>(0))?;
    names.collect()
}

fn current_user_version(conn: &Connection) -> Result<u32, ConnectionError> {
    conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))
        .map_err(ConnectionError::Schema)
}
