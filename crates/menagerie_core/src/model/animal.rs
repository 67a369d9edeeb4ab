//! Animal record and its references to `Toy` and `Owner`.
//!
//! # Invariants
//! - `favorite_toy_id` and `owner_id` point at existing rows once persisted;
//!   the store's foreign keys enforce this, not the model.

use super::entity::{
    ensure_non_nil, new_entity_id, Entity, EntityId, EntityValidationError, Timestamps,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Animal {
    id: EntityId,
    pub name: String,
    pub age: u32,
    /// References `toys.id`.
    pub favorite_toy_id: Option<EntityId>,
    /// References `owners.id`.
    pub owner_id: Option<EntityId>,
    #[serde(flatten)]
    timestamps: Timestamps,
}

/// Field changes for `Animal`.
///
/// Reference fields use a nested `Option`: `Some(None)` clears the reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimalPatch {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub favorite_toy_id: Option<Option<EntityId>>,
    pub owner_id: Option<Option<EntityId>>,
}

impl Animal {
    /// Creates an animal with a generated id and no references.
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self::from_parts(new_entity_id(), name, age, None, None, Timestamps::now())
    }

    /// Creates an animal with a caller-provided id.
    ///
    /// # Errors
    /// - `EntityValidationError::NilId` for the nil uuid.
    pub fn with_id(
        id: EntityId,
        name: impl Into<String>,
        age: u32,
    ) -> Result<Self, EntityValidationError> {
        let id = ensure_non_nil(id)?;
        Ok(Self::from_parts(id, name, age, None, None, Timestamps::now()))
    }

    pub fn with_favorite_toy(mut self, toy_id: EntityId) -> Self {
        self.favorite_toy_id = Some(toy_id);
        self
    }

    pub fn with_owner(mut self, owner_id: EntityId) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub(crate) fn from_parts(
        id: EntityId,
        name: impl Into<String>,
        age: u32,
        favorite_toy_id: Option<EntityId>,
        owner_id: Option<EntityId>,
        timestamps: Timestamps,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            age,
            favorite_toy_id,
            owner_id,
            timestamps,
        }
    }
}

impl Entity for Animal {
    type Patch = AnimalPatch;

    const KIND: &'static str = "animal";

    fn id(&self) -> EntityId {
        self.id
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn touch(&mut self) {
        self.timestamps.touch();
    }

    fn apply(&mut self, patch: AnimalPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(favorite_toy_id) = patch.favorite_toy_id {
            self.favorite_toy_id = favorite_toy_id;
        }
        if let Some(owner_id) = patch.owner_id {
            self.owner_id = owner_id;
        }
    }

    fn describe(&self) -> String {
        format!(
            "Animal ID: {}, Name: {}, Age: {}",
            self.id, self.name, self.age
        )
    }
}
