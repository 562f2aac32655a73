//! Entity association row.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dochub_core::error::AppError;
use dochub_core::types::{DocumentId, ExternalId};

use super::kind::EntityRef;

/// Raw `entity_association` row.
///
/// The type tag is a bare string in storage; it becomes an
/// [`EntityRef`] as soon as it is read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EntityAssociation {
    /// The linked version record.
    pub record_id: DocumentId,
    /// Type tag of the external entity.
    pub entity_type: String,
    /// Id of the external entity.
    pub entity_id: ExternalId,
}

impl EntityAssociation {
    /// Build the storage row for a link.
    pub fn new(record_id: DocumentId, entity: EntityRef) -> Self {
        Self {
            record_id,
            entity_type: entity.kind.as_str().to_string(),
            entity_id: entity.id,
        }
    }

    /// Parse the typed reference out of the row.
    pub fn entity(&self) -> Result<EntityRef, AppError> {
        Ok(EntityRef::new(self.entity_type.parse()?, self.entity_id))
    }
}

impl TryFrom<EntityAssociation> for EntityRef {
    type Error = AppError;

    fn try_from(row: EntityAssociation) -> Result<Self, Self::Error> {
        row.entity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::EntityKind;

    #[test]
    fn test_row_round_trip() {
        let record_id = DocumentId::new();
        let row = EntityAssociation::new(record_id, EntityRef::new(EntityKind::Lead, 42));
        assert_eq!(row.entity_type, "Lead");
        assert_eq!(row.entity().unwrap(), EntityRef::new(EntityKind::Lead, 42));
    }

    #[test]
    fn test_unknown_type_tag_is_rejected() {
        let row = EntityAssociation {
            record_id: DocumentId::new(),
            entity_type: "Spaceship".to_string(),
            entity_id: 1,
        };
        assert!(row.entity().is_err());
    }
}
