//! Identity, timestamps and the `Entity` capability shared by all records.
//!
//! # Responsibility
//! - Generate stable identifiers and creation/update timestamps.
//! - Expose a uniform read-only view (`id`, `describe`) over every entity kind.
//!
//! # Invariants
//! - Identifiers have no setter; they are set once by a constructor.
//! - `Timestamps::touch` always produces a strictly larger `updated_at`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier shared by every entity kind.
pub type EntityId = Uuid;

/// Validation failures raised before an entity reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityValidationError {
    /// The nil UUID is reserved and never identifies a stored row.
    NilId,
    /// `updated_at` is older than `created_at`.
    TimestampsOutOfOrder { created_at: i64, updated_at: i64 },
}

impl Display for EntityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "entity id must not be the nil uuid"),
            Self::TimestampsOutOfOrder {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must be >= created_at ({created_at})"
            ),
        }
    }
}

impl Error for EntityValidationError {}

/// Creation and last-update time in Unix epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    created_at: i64,
    updated_at: i64,
}

impl Timestamps {
    /// Stamps both fields with the current wall clock.
    pub fn now() -> Self {
        let now = now_epoch_ms();
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds timestamps read back from storage.
    pub fn from_parts(created_at: i64, updated_at: i64) -> Self {
        Self {
            created_at,
            updated_at,
        }
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    /// Refreshes `updated_at`.
    ///
    /// Two touches inside the same millisecond still yield increasing values.
    pub fn touch(&mut self) {
        let next = self.updated_at.saturating_add(1);
        self.updated_at = now_epoch_ms().max(next);
    }

    pub fn validate(&self) -> Result<(), EntityValidationError> {
        if self.updated_at < self.created_at {
            return Err(EntityValidationError::TimestampsOutOfOrder {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }
}

/// Behavior every persisted record provides.
pub trait Entity {
    /// Field changes accepted by `apply`.
    type Patch;

    /// Lowercase kind name used in logs, e.g. `toy`.
    const KIND: &'static str;

    fn id(&self) -> EntityId;

    fn timestamps(&self) -> &Timestamps;

    /// Marks the entity as modified now.
    fn touch(&mut self);

    /// Applies every present field of `patch`. Does not touch timestamps.
    fn apply(&mut self, patch: Self::Patch);

    /// One-line human-readable summary.
    fn describe(&self) -> String;

    /// Checks invariants that must hold before a write.
    fn validate(&self) -> Result<(), EntityValidationError> {
        if self.id().is_nil() {
            return Err(EntityValidationError::NilId);
        }
        self.timestamps().validate()
    }
}

pub(crate) fn ensure_non_nil(id: EntityId) -> Result<EntityId, EntityValidationError> {
    if id.is_nil() {
        return Err(EntityValidationError::NilId);
    }
    Ok(id)
}

pub(crate) fn new_entity_id() -> EntityId {
    Uuid::new_v4()
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
