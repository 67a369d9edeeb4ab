//! Core persistence for the menagerie sample: toys, owners and the animals
//! that reference them, stored through a generic repository.

pub mod config;
pub mod db;
pub mod demo;
pub mod logging;
pub mod model;
pub mod repo;

pub use config::{AppConfig, ConfigError, DatabaseConfig, LogConfig, StoreLocation};
pub use db::{
    ConnectionError, Database, PoolStatus, Session, SessionState, StorageError, StorageResult,
};
pub use demo::{run_demo, DemoOutcome};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::animal::{Animal, AnimalPatch};
pub use model::entity::{Entity, EntityId, EntityValidationError, Timestamps};
pub use model::owner::{Owner, OwnerPatch};
pub use model::toy::{Toy, ToyPatch};
pub use repo::entity_repo::{Repository, SqliteRepository};
pub use repo::record::Record;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
