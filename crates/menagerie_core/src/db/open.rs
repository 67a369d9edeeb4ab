//! Connection/session factory.
//!
//! # Responsibility
//! - Turn a `DatabaseConfig` into a validated, migrated connection pool.
//! - Configure pragmas on every pooled connection.
//! - Start new units of work (`Session`).
//!
//! # Invariants
//! - Pooled connections have `foreign_keys=ON` and a busy timeout.
//! - With `pool_pre_ping`, a connection is validated before each checkout.
//! - With `pool_recycle`, connections older than the limit are replaced.
//! - A connection returned with an open transaction is rolled back or
//!   discarded before anyone else checks it out.
//! - In-memory stores keep exactly one connection alive, never recycled.

use super::manager::StoreManager;
use super::migrations::apply_migrations;
use super::session::Session;
use super::{ConnectionError, StorageResult};
use crate::config::{DatabaseConfig, StoreLocation};
use log::{error, info};
use r2d2::{LoggingErrorHandler, Pool};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Pool occupancy snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub connections: u32,
    pub idle_connections: u32,
}

/// Pooled handle to one store; cheap to share by reference.
pub struct Database {
    pool: Pool<StoreManager>,
    location: StoreLocation,
}

impl Database {
    /// Opens the store named by `config.url`, builds the pool and applies
    /// pending migrations.
    ///
    /// Calling this repeatedly against the same store is safe.
    ///
    /// # Side effects
    /// - Creates the database file if it does not exist.
    /// - Emits `db_open` logging events with duration and status.
    ///
    /// # Errors
    /// Every failure is a `ConnectionError`; see its variants.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, ConnectionError> {
        let started_at = Instant::now();

        let location = match config.location() {
            Ok(location) => location,
            Err(reason) => {
                let err = ConnectionError::InvalidUrl {
                    url: config.url.clone(),
                    reason,
                };
                error!(
                    "event=db_open module=db status=error mode=unknown error_code={} error={}",
                    err.code(),
                    err
                );
                return Err(err);
            }
        };

        let mode = mode_label(&location);
        info!("event=db_open module=db status=start mode={mode}");

        match build_pool(config, &location) {
            Ok(pool) => {
                info!(
                    "event=db_open module=db status=ok mode={} duration_ms={} max_connections={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    pool.max_size()
                );
                Ok(Self { pool, location })
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={} duration_ms={} error_code={} error={}",
                    mode,
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Shorthand for a private in-memory store.
    ///
    /// # Errors
    /// Same as [`Database::connect`].
    pub fn open_in_memory() -> Result<Self, ConnectionError> {
        Self::connect(&DatabaseConfig::in_memory())
    }

    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    /// Starts a unit of work on a pooled connection.
    ///
    /// Prefer [`Database::session_scope`], which guarantees commit or
    /// rollback and release.
    ///
    /// # Errors
    /// - `StorageError::Pool` when no connection frees up within the
    ///   configured timeout.
    pub fn session(&self) -> StorageResult<Session> {
        let conn = self.pool.get()?;
        Ok(Session::new(conn))
    }

    pub fn pool_status(&self) -> PoolStatus {
        let state = self.pool.state();
        PoolStatus {
            connections: state.connections,
            idle_connections: state.idle_connections,
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("location", &self.location)
            .field("pool", &self.pool_status())
            .finish()
    }
}

fn build_pool(
    config: &DatabaseConfig,
    location: &StoreLocation,
) -> Result<Pool<StoreManager>, ConnectionError> {
    let builder = Pool::<StoreManager>::builder()
        .test_on_check_out(config.pool_pre_ping)
        .connection_timeout(config.connection_timeout)
        .error_handler(Box::new(LoggingErrorHandler));

    let (manager, builder) = match location {
        StoreLocation::Memory => (
            SqliteConnectionManager::memory(),
            builder
                .max_size(1)
                .min_idle(Some(1))
                .max_lifetime(None)
                .idle_timeout(None),
        ),
        StoreLocation::File(path) => {
            check_file_opens(path)?;
            (
                SqliteConnectionManager::file(path),
                builder
                    .max_size(config.max_connections.max(1))
                    .min_idle(Some(1))
                    .max_lifetime(config.pool_recycle.filter(|age| !age.is_zero())),
            )
        }
    };

    let pool = builder
        .build(StoreManager::new(manager.with_init(configure_connection)))
        .map_err(ConnectionError::Pool)?;

    let mut conn = pool.get().map_err(ConnectionError::Pool)?;
    apply_migrations(&mut conn)?;

    Ok(pool)
}

/// Opens the file once outside the pool so an unreachable path fails
/// immediately instead of after the checkout timeout.
fn check_file_opens(path: &Path) -> Result<(), ConnectionError> {
    let mut conn = Connection::open(path).map_err(ConnectionError::Open)?;
    configure_connection(&mut conn).map_err(ConnectionError::Open)?;
    conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))
        .map_err(ConnectionError::Open)?;
    Ok(())
}

fn configure_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

fn mode_label(location: &StoreLocation) -> &'static str {
    match location {
        StoreLocation::Memory => "memory",
        StoreLocation::File(_) => "file",
    }
}
