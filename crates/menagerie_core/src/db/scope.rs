//! Transactional scope: one session, one commit-or-rollback decision.
//!
//! # Invariants
//! - `Ok` from the closure commits; `Err` rolls back and is returned as-is.
//! - The session is closed exactly once on every path, including panics.
//! - Scopes do not nest; a scope never opens a second session.

use super::open::Database;
use super::session::Session;
use super::StorageResult;
use log::{error, warn};

impl Database {
    /// Runs `work` inside a fresh unit of work.
    ///
    /// Repository mutations commit on their own; what this scope commits or
    /// rolls back is whatever is still pending when `work` returns.
    ///
    /// # Errors
    /// - Connection checkout failure.
    /// - Any error returned by `work`, after rollback.
    /// - A failing final commit, after rollback.
    pub fn session_scope<T, F>(&self, work: F) -> StorageResult<T>
    where
        F: FnOnce(&Session) -> StorageResult<T>,
    {
        let session = self.session()?;
        let outcome = work(&session).and_then(|value| session.commit().map(|()| value));

        match outcome {
            Ok(value) => {
                session.close();
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = session.rollback() {
                    error!(
                        "event=session_rollback module=db status=error session_id={} error_code={} error={}",
                        session.id(),
                        rollback_err.code(),
                        rollback_err
                    );
                }
                warn!(
                    "event=session_rollback module=db status=ok session_id={} error_code={} error={}",
                    session.id(),
                    err.code(),
                    err
                );
                session.close();
                Err(err)
            }
        }
    }
}
