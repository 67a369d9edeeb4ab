//! Toy record.

use super::entity::{
    ensure_non_nil, new_entity_id, Entity, EntityId, EntityValidationError, Timestamps,
};
use serde::{Deserialize, Serialize};

/// A toy an animal can pick as its favorite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toy {
    id: EntityId,
    pub name: String,
    /// Material or kind of toy; stored as `toys.toy_type`.
    pub category: String,
    #[serde(flatten)]
    timestamps: Timestamps,
}

/// Field changes for `Toy`. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToyPatch {
    pub name: Option<String>,
    pub category: Option<String>,
}

impl Toy {
    /// Creates a toy with a generated id.
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self::from_parts(new_entity_id(), name, category, Timestamps::now())
    }

    /// Creates a toy with a caller-provided id.
    ///
    /// # Errors
    /// - `EntityValidationError::NilId` for the nil uuid.
    pub fn with_id(
        id: EntityId,
        name: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<Self, EntityValidationError> {
        let id = ensure_non_nil(id)?;
        Ok(Self::from_parts(id, name, category, Timestamps::now()))
    }

    pub(crate) fn from_parts(
        id: EntityId,
        name: impl Into<String>,
        category: impl Into<String>,
        timestamps: Timestamps,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            timestamps,
        }
    }
}

impl Entity for Toy {
    type Patch = ToyPatch;

    const KIND: &'static str = "toy";

    fn id(&self) -> EntityId {
        self.id
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn touch(&mut self) {
        self.timestamps.touch();
    }

    fn apply(&mut self, patch: ToyPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
    }

    fn describe(&self) -> String {
        format!(
            "Toy ID: {}, Name: {}, Type: {}",
            self.id, self.name, self.category
        )
    }
}
