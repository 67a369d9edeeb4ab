//! Entity model for toys, owners and animals.
//!
//! # Responsibility
//! - Define the records persisted by the repository layer.
//! - Own identity and timestamp bookkeeping; the store never writes either.
//!
//! # Invariants
//! - Every entity is identified by a non-nil `EntityId` fixed at construction.
//! - `updated_at` only moves forward.

pub mod animal;
pub mod entity;
pub mod owner;
pub mod toy;
