//! The fixed demo sequence run by the `menagerie` binary.

use crate::db::{Database, StorageResult};
use crate::model::animal::Animal;
use crate::model::entity::Entity;
use crate::model::owner::Owner;
use crate::model::toy::Toy;
use crate::repo::entity_repo::{Repository, SqliteRepository};

/// What the demo inserted and what it read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoOutcome {
    pub toy: Toy,
    pub owner: Owner,
    pub inserted: Animal,
    /// The animal as fetched by id after insertion.
    pub fetched: Option<Animal>,
}

impl DemoOutcome {
    /// The line printed by the binary.
    pub fn report(&self) -> String {
        self.fetched
            .as_ref()
            .map_or_else(|| "Animal not found.".to_string(), |animal| animal.describe())
    }
}

/// Inserts a toy, an owner and an animal referencing both, then fetches the
/// animal back, all inside one scope.
///
/// # Errors
/// Any `StorageError` raised by the scope or the repository.
pub fn run_demo(db: &Database) -> StorageResult<DemoOutcome> {
    db.session_scope(|session| {
        let repo = SqliteRepository::new(session);

        let toy = Toy::new("Chew Toy", "Rubber");
        let owner = Owner::new("John Doe", "john@example.com");
        repo.add(&toy)?;
        repo.add(&owner)?;

        let baxter = Animal::new("Baxter", 5)
            .with_favorite_toy(toy.id())
            .with_owner(owner.id());
        repo.add(&baxter)?;

        let fetched = repo.get_by_id::<Animal>(baxter.id())?;
        Ok(DemoOutcome {
            toy,
            owner,
            inserted: baxter,
            fetched,
        })
    })
}
