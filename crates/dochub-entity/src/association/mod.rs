//! Polymorphic links from version records to external CRM entities.

pub mod kind;
pub mod label;
pub mod model;
pub mod tag;

pub use kind::{EntityKind, EntityRef, LeadSubtype};
pub use label::LabelColumn;
pub use model::EntityAssociation;
pub use tag::{RecordTag, Tag, VERSION_RECORD_ENTITY_TYPE};
