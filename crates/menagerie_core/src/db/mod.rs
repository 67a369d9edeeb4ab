//! SQLite storage: connection pool, units of work and schema migrations.
//!
//! # Responsibility
//! - Open a pooled store from a connection string (`Database::connect`).
//! - Hand out `Session`s and wrap them in commit/rollback scopes.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Every pooled connection has `foreign_keys=ON`.
//! - No session is handed out before migrations succeed.
//! - Migration version is tracked via `PRAGMA user_version`.

use crate::model::entity::EntityValidationError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod manager;
pub mod migrations;
mod open;
mod scope;
mod session;

pub use open::{Database, PoolStatus};
pub use session::{Session, SessionState};

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure to bring a store online. Only `Database::connect` returns it.
#[derive(Debug)]
pub enum ConnectionError {
    InvalidUrl {
        url: String,
        reason: String,
    },
    Open(rusqlite::Error),
    Pool(r2d2::Error),
    Schema(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl ConnectionError {
    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "invalid_url",
            Self::Open(_) => "db_open_failed",
            Self::Pool(_) => "pool_build_failed",
            Self::Schema(_) => "schema_migration_failed",
            Self::UnsupportedSchemaVersion { .. } => "unsupported_schema_version",
        }
    }
}

impl Display for ConnectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl { url, reason } => {
                write!(f, "invalid connection string `{url}`: {reason}")
            }
            Self::Open(err) => write!(f, "cannot open database: {err}"),
            Self::Pool(err) => write!(f, "cannot build connection pool: {err}"),
            Self::Schema(err) => write!(f, "schema migration failed: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for ConnectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open(err) | Self::Schema(err) => Some(err),
            Self::Pool(err) => Some(err),
            Self::InvalidUrl { .. } | Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

/// Failure inside a unit of work.
#[derive(Debug)]
pub enum StorageError {
    /// Primary key, foreign key, `CHECK` or `NOT NULL` violation.
    Constraint(rusqlite::Error),
    Sqlite(rusqlite::Error),
    /// No pooled connection could be checked out.
    Pool(r2d2::Error),
    Validation(EntityValidationError),
    /// A stored row does not decode into its entity.
    InvalidData(String),
    /// Caller-raised failure that aborted a scope.
    Aborted(Box<dyn Error + Send + Sync>),
}

impl StorageError {
    /// Wraps an arbitrary error so a scope closure can abort with it.
    pub fn aborted(cause: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        Self::Aborted(cause.into())
    }

    /// Stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Constraint(_) => "constraint_violation",
            Self::Sqlite(_) => "sqlite_error",
            Self::Pool(_) => "pool_checkout_failed",
            Self::Validation(_) => "validation_failed",
            Self::InvalidData(_) => "invalid_data",
            Self::Aborted(_) => "aborted",
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constraint(err) => write!(f, "constraint violation: {err}"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Pool(err) => write!(f, "cannot check out connection: {err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
            Self::Aborted(err) => write!(f, "unit of work aborted: {err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Constraint(err) | Self::Sqlite(err) => Some(err),
            Self::Pool(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::Aborted(err) => Some(err.as_ref()),
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        match value.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => Self::Constraint(value),
            _ => Self::Sqlite(value),
        }
    }
}

impl From<r2d2::Error> for StorageError {
    fn from(value: r2d2::Error) -> Self {
        Self::Pool(value)
    }
}

impl From<EntityValidationError> for StorageError {
    fn from(value: EntityValidationError) -> Self {
        Self::Validation(value)
    }
}
