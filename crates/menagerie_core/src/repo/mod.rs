//! Repository layer: a generic CRUD facade over mapped entities.
//!
//! # Responsibility
//! - Define the storage-agnostic `Repository` contract.
//! - Map entities onto tables (`Record`) for the SQLite implementation.
//!
//! # Invariants
//! - A repository borrows a session for its lifetime and never owns it.
//! - Each mutating call is individually durable.

pub mod entity_repo;
pub mod record;
