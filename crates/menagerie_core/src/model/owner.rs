//! Owner record.

use super::entity::{
    ensure_non_nil, new_entity_id, Entity, EntityId, EntityValidationError, Timestamps,
};
use serde::{Deserialize, Serialize};

/// A person responsible for one or more animals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    id: EntityId,
    pub name: String,
    /// Free-form contact string, usually an email address.
    pub contact_info: String,
    #[serde(flatten)]
    timestamps: Timestamps,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerPatch {
    pub name: Option<String>,
    pub contact_info: Option<String>,
}

impl Owner {
    pub fn new(name: impl Into<String>, contact_info: impl Into<String>) -> Self {
        Self::from_parts(new_entity_id(), name, contact_info, Timestamps::now())
    }

    /// Creates an owner with a caller-provided id.
    ///
    /// # Errors
    /// - `EntityValidationError::NilId` for the nil uuid.
    pub fn with_id(
        id: EntityId,
        name: impl Into<String>,
        contact_info: impl Into<String>,
    ) -> Result<Self, EntityValidationError> {
        let id = ensure_non_nil(id)?;
        Ok(Self::from_parts(id, name, contact_info, Timestamps::now()))
    }

    pub(crate) fn from_parts(
        id: EntityId,
        name: impl Into<String>,
        contact_info: impl Into<String>,
        timestamps: Timestamps,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            contact_info: contact_info.into(),
            timestamps,
        }
    }
}

impl Entity for Owner {
    type Patch = OwnerPatch;

    const KIND: &'static str = "owner";

    fn id(&self) -> EntityId {
        self.id
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }

    fn touch(&mut self) {
        self.timestamps.touch();
    }

    fn apply(&mut self, patch: OwnerPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(contact_info) = patch.contact_info {
            self.contact_info = contact_info;
        }
    }

    fn describe(&self) -> String {
        format!(
            "Owner ID: {}, Name: {}, Contact: {}",
            self.id, self.name, self.contact_info
        )
    }
}
