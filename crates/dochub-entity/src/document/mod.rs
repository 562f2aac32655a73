//! Version record entities and chain helpers.

pub mod chain;
pub mod content;
pub mod record;

pub use chain::resolve_root;
pub use content::ContentLocation;
pub use record::{CreateDocument, CreateVersion, NewVersionRecord, VersionRecord};
