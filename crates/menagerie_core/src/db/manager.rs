//! Pool connection manager.
//!
//! Wraps `SqliteConnectionManager` so a connection returned to the pool in
//! the middle of a transaction is never handed to the next session.

use log::warn;
use r2d2::ManageConnection;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

pub(crate) struct StoreManager {
    inner: SqliteConnectionManager,
}

impl StoreManager {
    pub(crate) fn new(inner: SqliteConnectionManager) -> Self {
        Self { inner }
    }
}

impl ManageConnection for StoreManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    fn connect(&self) -> Result<Connection, rusqlite::Error> {
        self.inner.connect()
    }

    fn is_valid(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        self.inner.is_valid(conn)
    }

    /// Called by the pool on every return. A leftover transaction gets one
    /// more `ROLLBACK`; if it stays open the connection is discarded.
    fn has_broken(&self, conn: &mut Connection) -> bool {
        if conn.is_autocommit() {
            return false;
        }
        if let Err(err) = conn.execute_batch("ROLLBACK;") {
            warn!(
                "event=pool_return module=db status=discarded error_code=open_transaction error={}",
                err
            );
            return true;
        }
        !conn.is_autocommit()
    }
}
