//! Unit of work over one pooled connection.
//!
//! # Responsibility
//! - Begin a transaction lazily on the first write.
//! - Commit or roll back on request; release the connection on close.
//!
//! # Invariants
//! - At most one transaction is open per session.
//! - `commit`/`rollback` with nothing pending are no-ops.
//! - A session is released exactly once: by `close` or, failing that, by drop.
//!   Pending work is rolled back on release.

use super::manager::StoreManager;
use super::StorageResult;
use log::{debug, error};
use r2d2::PooledConnection;
use rusqlite::{Connection, Params};
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Where a session stands in its commit/rollback lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No decision yet for the current unit of work.
    Active,
    Committed,
    RolledBack,
}

/// A unit of work bound to one pooled connection.
///
/// Not shareable across threads; each logical operation uses its own session.
pub struct Session {
    id: u64,
    conn: PooledConnection<StoreManager>,
    state: Cell<SessionState>,
}

impl Session {
    pub(crate) fn new(conn: PooledConnection<StoreManager>) -> Self {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        debug!("event=session_open module=db status=ok session_id={id}");
        Self {
            id,
            conn,
            state: Cell::new(SessionState::Active),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state.get()
    }

    /// Whether uncommitted writes are pending.
    pub fn has_pending_work(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Underlying connection for reads.
    ///
    /// Writes issued here bypass the unit of work; use [`Session::execute`].
    pub fn connection(&self) -> &Connection {
        &*self.conn
    }

    /// Runs a write statement inside the pending unit of work.
    ///
    /// # Errors
    /// Returns the classified SQLite failure; the unit of work stays open.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> StorageResult<usize> {
        let conn = self.begin_write()?;
        Ok(conn.execute(sql, params)?)
    }

    /// Commits pending work, if any.
    ///
    /// # Errors
    /// Returns the SQLite failure; the transaction is left open for rollback.
    pub fn commit(&self) -> StorageResult<()> {
        if self.has_pending_work() {
            self.conn.execute_batch("COMMIT;")?;
            debug!(
                "event=session_commit module=db status=ok session_id={}",
                self.id
            );
        }
        self.state.set(SessionState::Committed);
        Ok(())
    }

    /// Discards pending work, if any.
    ///
    /// # Errors
    /// Returns the SQLite failure of the `ROLLBACK` statement.
    pub fn rollback(&self) -> StorageResult<()> {
        if self.has_pending_work() {
            self.conn.execute_batch("ROLLBACK;")?;
            debug!(
                "event=session_rollback module=db status=ok session_id={}",
                self.id
            );
        }
        self.state.set(SessionState::RolledBack);
        Ok(())
    }

    /// Releases the session, rolling back anything still pending.
    pub fn close(self) {}

    /// Opens an immediate transaction unless one is already pending.
    pub(crate) fn begin_write(&self) -> StorageResult<&Connection> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN IMMEDIATE;")?;
            self.state.set(SessionState::Active);
        }
        Ok(&*self.conn)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.conn.is_autocommit() {
            if let Err(err) = self.conn.execute_batch("ROLLBACK;") {
                // The pool checks the connection again on return and drops
                // it if the transaction is still open.
                error!(
                    "event=session_close module=db status=error session_id={} error_code=rollback_failed error={}",
                    self.id, err
                );
                return;
            }
            self.state.set(SessionState::RolledBack);
        }
        debug!(
            "event=session_close module=db status=ok session_id={} state={:?}",
            self.id,
            self.state.get()
        );
    }
}
